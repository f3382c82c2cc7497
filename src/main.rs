use clap::Parser;
use dirsweep::cli::{Cli, run_cli};
use dirsweep::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_env("RUST_LOG")
        .format_timestamp_secs()
        .init();

    if let Err(e) = run_cli(cli) {
        OutputFormatter::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
