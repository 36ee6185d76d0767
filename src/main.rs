/*!
 * Command-line interface for chronicle
 */

use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use tracing_subscriber::EnvFilter;

use chronicle::config::{Args, Config};
use chronicle::generate::generate;
use chronicle::report::Reporter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "CHRONICLE_LOG";

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Create configuration
    let config = Config::from_args(args);

    // Validate before the thread pool or progress bar exist
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        tracing::warn!("Failed to set thread pool size: {}", e);
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos} entries ⏱️  {elapsed_precise}")
    {
        progress.set_style(style);
    }
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix("Scanning");
    progress.set_message(format!("📂 {}", config.target_dir.display()));

    let summary = generate(&config, Arc::new(progress.clone()));

    // Clear the progress bar
    progress.finish_and_clear();
    let summary = summary?;

    if let Some(path) = &summary.outputs.export_file {
        println!("Script summary saved to {}", path.display());
    }
    if let Some(path) = &summary.outputs.index_file {
        println!("File index saved to {}", path.display());
    }

    let reporter = Reporter::new(config.report);
    reporter.print_report(&summary.to_report())?;

    Ok(())
}
