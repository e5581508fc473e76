use crate::cli::AnalyzeArgs;
use analyzer::config::RunConfig;
use analyzer::execution::config::AnalysisConfigBuilder;
use analyzer::runner::{AnalysisTarget, format_elapsed, run_analysis};
use analyzer::stats::RunStatistics;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

fn handle_statistics_output(stats: &RunStatistics, stats_output: Option<Option<PathBuf>>) {
    if let Some(Some(stats_path)) = stats_output {
        match stats.export_to_file(&stats_path) {
            Ok(()) => info!("Statistics saved to: {}", stats_path.display()),
            Err(e) => error!("Failed to save statistics: {e}"),
        }
    }
}

fn target(args: &AnalyzeArgs) -> Result<AnalysisTarget> {
    let mut target = match (&args.config, &args.library) {
        (Some(config_path), Some(library)) => {
            let run_config = RunConfig::load(config_path)?;
            AnalysisTarget::from_library(&run_config, library)?
        }
        _ => {
            let output = args
                .output
                .clone()
                .context("--output is required with --source")?;
            AnalysisTarget::from_sources(
                args.sources.clone(),
                output,
                AnalysisConfigBuilder::build(0),
            )
        }
    };

    if let Some(threads) = args.threads {
        target.config.worker_threads = AnalysisConfigBuilder::get_effective_threads(threads);
    }
    if let Some(strict) = args.strict_parse() {
        target.config.strict_parse = strict;
    }
    Ok(target)
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();
    let target = target(&args)?;

    // Progress already reaches stdout through the subscriber
    let stats = run_analysis(target, |_| {}).inspect_err(|e| error!("❌ Analysis failed: {e:#}"))?;

    handle_statistics_output(&stats, args.stats);
    println!("Elapsed: {}", format_elapsed(start_time.elapsed()));
    Ok(())
}
