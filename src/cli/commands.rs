use clap::Parser;
use std::path::PathBuf;

/// Bitbucket pipeline build step deletion tool
#[derive(Parser, Debug)]
#[command(
    name = "pipeprune",
    about = "Removes obsolete Bitbucket Pipelines build steps across repositories and opens review pull requests",
    version,
    author,
    long_about = "pipeprune reads a JSON configuration naming obsolete pipeline build steps, \
                  removes their definition blocks from each configured repository's pipeline \
                  files, and opens one pull request per repository with the configured \
                  reviewers attached.\n\n\
                  Examples:\n  \
                  pipeprune\n  \
                  pipeprune --config fleet.json\n  \
                  pipeprune --dry-run --verbose"
)]
pub struct CliArgs {
    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        default_value = "config.json",
        help = "Path to the JSON configuration file"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'd',
        long,
        help = "Report which files would change without committing or opening pull requests"
    )]
    pub dry_run: bool,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output (debug-level logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["pipeprune"]);
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(!args.dry_run);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::parse_from(["pipeprune", "-c", "fleet.json", "--dry-run", "-v"]);
        assert_eq!(args.config, PathBuf::from("fleet.json"));
        assert!(args.dry_run);
        assert!(args.verbose);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = CliArgs::try_parse_from(["pipeprune", "-q", "-v"]);
        assert!(result.is_err());
    }
}
