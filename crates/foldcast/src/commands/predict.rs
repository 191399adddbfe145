use crate::batch::TokenBatches;
use crate::cli::Cli;
use crate::pipeline::{annotate_records, run_batches};
use crate::reporter::LogReporter;
use anyhow::{Context, Result};
use foldcast_io::{read_fasta, write_fasta};
use foldcast_onnx::{EsmFold, EsmFoldConfig};
use itertools::Itertools;
use std::fs;

pub fn execute(args: &Cli) -> Result<()> {
    fs::create_dir_all(&args.pdb)
        .with_context(|| format!("failed to create {}", args.pdb.display()))?;

    log::info!("Reading sequences from {}", args.fasta.display());
    let mut records = read_fasta(&args.fasta)?;
    log::info!(
        "Loaded {} sequences from {}",
        records.len(),
        args.fasta.display()
    );

    // shorter sequences first, so batches stay length-homogeneous and padding
    // in the forward pass is minimal
    let pairs: Vec<(String, String)> = records
        .iter()
        .sorted_by_key(|record| record.sequence.len())
        .map(|record| (record.header(), record.sequence.clone()))
        .collect();
    let num_sequences = pairs.len();

    log::info!("Loading model");
    let mut model = EsmFold::load(&EsmFoldConfig {
        model_dir: args.model_dir.clone(),
        chunk_size: args.chunk_size,
        cpu_only: args.cpu_only,
        cpu_offload: args.cpu_offload,
    })
    .context("failed to load model")?;

    log::info!("Starting predictions");
    let batches = TokenBatches::new(pairs, args.max_tokens_per_batch)?;
    let stats = run_batches(
        &mut model,
        batches,
        &mut LogReporter,
        &args.pdb,
        args.num_recycles,
        num_sequences,
    )?;

    if stats.num_completed > 0 {
        annotate_records(&mut records, &stats);
        write_fasta(&records, &args.fasta)
            .with_context(|| format!("failed to annotate {}", args.fasta.display()))?;
    }
    Ok(())
}
