mod cli;
mod commands;

use crate::cli::{Commands, JxrefCli};
use logging::LogMode;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    let cli = JxrefCli::parse_args();

    match cli.command {
        Commands::Analyze(args) => {
            let mode = match &args.log_dir {
                Some(directory) => LogMode::File {
                    directory: directory.clone(),
                },
                None => LogMode::Cli,
            };
            let _guards = logging::init(mode, args.verbose)?;
            commands::analyze::run(args)
        }
        Commands::Resolve {
            sources,
            lenient,
            verbose,
            names,
        } => {
            let _guards = logging::init(LogMode::Cli, verbose)?;
            commands::resolve::run(&sources, &names, !lenient)
        }
    }
}
