use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "foldcast", author, version, about = "Batch protein structure prediction from FASTA", long_about = None)]
pub struct Cli {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "fasta")]
    #[clap(help = "Path to input FASTA file")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub fasta: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "pdb")]
    #[clap(help = "Path to output PDB directory")]
    #[clap(value_name = "DIR")]
    pub pdb: PathBuf,

    #[clap(short = 'm')]
    #[clap(long = "model-dir")]
    #[clap(help = "Directory with pre-downloaded model data (overrides the hub cache)")]
    #[clap(value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    #[clap(long = "num-recycles")]
    #[clap(value_name = "N")]
    #[clap(help = "Number of recycles to run. Defaults to the number used in training (4)")]
    pub num_recycles: Option<usize>,

    #[clap(long = "max-tokens-per-batch")]
    #[clap(value_name = "N")]
    #[clap(default_value = "1024")]
    #[arg(value_parser = positive_usize)]
    #[clap(
        help = "Maximum number of residues per forward pass; shorter sequences are grouped for \
                batched prediction. Lowering this can help with out-of-memory failures"
    )]
    pub max_tokens_per_batch: usize,

    #[clap(long = "chunk-size")]
    #[clap(value_name = "N")]
    #[clap(help = "Chunk the axial attention computation to reduce memory usage at the cost of speed. Recommended values: 128, 64, 32")]
    pub chunk_size: Option<usize>,

    #[clap(long = "cpu-only")]
    #[clap(help = "CPU only")]
    #[clap(conflicts_with = "cpu_offload")]
    pub cpu_only: bool,

    #[clap(long = "cpu-offload")]
    #[clap(help = "Enable CPU offloading of activations")]
    pub cpu_offload: bool,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level")]
    pub verbosity: u8,
}

pub fn init_logger(cli: &Cli) {
    let filter_level: LevelFilter = match cli.verbosity {
        0 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {} | {}",
                chrono::Local::now().format("%y/%m/%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(format!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn positive_usize(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(String::from("value must be a positive integer")),
        Err(e) => Err(e.to_string()),
    }
}
