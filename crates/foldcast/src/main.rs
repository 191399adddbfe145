use clap::Parser;
use foldcast::cli::{init_logger, Cli};
use foldcast::commands::predict;

fn main() {
    let cli = Cli::parse();
    init_logger(&cli);
    log::info!(
        "Running {}-{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if let Err(e) = predict::execute(&cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
