use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jxref",
    version,
    about = "Java cross-reference analyzer",
    long_about = "Resolves every type reference, declaration and method call of a Java source tree \
                  against the whole tree and writes the facts as Parquet reports."
)]
pub struct JxrefCli {
    #[command(subcommand)]
    pub command: Commands,
}

impl JxrefCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a configured library or a set of source directories
    Analyze(AnalyzeArgs),
    /// Resolve fully qualified names against source directories
    Resolve {
        /// Source root, may be repeated. Earlier roots take precedence.
        #[arg(long = "source", value_name = "DIR", required = true)]
        sources: Vec<PathBuf>,

        /// Accept files that contain syntax errors
        #[arg(long)]
        lenient: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Fully qualified type names
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Run configuration file
    #[arg(long, value_name = "FILE", requires = "library", conflicts_with_all = ["sources", "output"])]
    pub config: Option<PathBuf>,

    /// Library of the run configuration to analyze
    #[arg(long, value_name = "NAME", requires = "config")]
    pub library: Option<String>,

    /// Source root, may be repeated. Earlier roots take precedence.
    #[arg(
        long = "source",
        value_name = "DIR",
        required_unless_present = "config",
        requires = "output"
    )]
    pub sources: Vec<PathBuf>,

    /// Directory the reports are written to
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of worker threads (0 means auto-detect based on CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Reject files that contain syntax errors
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,

    /// Accept files that contain syntax errors
    #[arg(long)]
    pub lenient: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs to a rotating file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Output statistics. Optionally specify a file path to save to.
    #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
    pub stats: Option<Option<PathBuf>>,
}

impl AnalyzeArgs {
    /// The strictness requested on the command line, if any.
    pub fn strict_parse(&self) -> Option<bool> {
        match (self.strict, self.lenient) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn analyze(args: &[&str]) -> Result<AnalyzeArgs, clap::Error> {
        let cli = JxrefCli::try_parse_from(["jxref", "analyze"].iter().chain(args))?;
        match cli.command {
            Commands::Analyze(args) => Ok(args),
            Commands::Resolve { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_cli_is_well_formed() {
        JxrefCli::command().debug_assert();
    }

    #[test]
    fn test_analyze_sources() {
        let args = analyze(&["--source", "a", "--source", "b", "--output", "out", "--lenient"]).unwrap();
        assert_eq!(args.sources, [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.strict_parse(), Some(false));
        assert_eq!(args.stats, None);
    }

    #[test]
    fn test_analyze_config_and_stats() {
        let args = analyze(&["--config", "jxref.toml", "--library", "openjdk", "--stats=s.json"]).unwrap();
        assert_eq!(args.library.as_deref(), Some("openjdk"));
        assert_eq!(args.stats, Some(Some(PathBuf::from("s.json"))));
        assert_eq!(args.strict_parse(), None);

        let args = analyze(&["--config", "jxref.toml", "--library", "openjdk", "--stats"]).unwrap();
        assert_eq!(args.stats, Some(None));
    }

    #[test]
    fn test_analyze_rejects_mixed_inputs() {
        assert!(analyze(&["--config", "jxref.toml"]).is_err());
        assert!(analyze(&["--source", "a"]).is_err());
        assert!(analyze(&["--config", "c.toml", "--library", "x", "--source", "a", "--output", "o"]).is_err());
        assert!(analyze(&["--source", "a", "--output", "o", "--strict", "--lenient"]).is_err());
    }
}
