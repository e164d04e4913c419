//! Command handling: wires configuration, the Bitbucket client and the
//! orchestrator together, then renders the run summary.

use tracing::{error, info};

use crate::config::{Configuration, Credentials};
use crate::remote::bitbucket::BitbucketClient;
use crate::run::orchestrator::PruningOrchestrator;
use crate::run::summary::RunSummary;

use super::commands::CliArgs;

const EXIT_OK: i32 = 0;
const EXIT_FAILURES: i32 = 1;
const EXIT_CONFIG: i32 = 2;

/// Runs one pruning pass and returns the process exit code: 0 on success,
/// 1 when any repository failed, 2 on configuration/credential errors.
pub async fn handle_run(args: &CliArgs) -> i32 {
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(err) => {
            error!("{}", err);
            return EXIT_CONFIG;
        }
    };

    let config = match Configuration::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return EXIT_CONFIG;
        }
    };
    info!(config = %args.config.display(), workspace = %config.workspace, "configuration loaded");

    let client = BitbucketClient::new(config.workspace.clone(), credentials);
    let orchestrator = PruningOrchestrator::new(&client, &config, args.dry_run);
    let summary = orchestrator.run().await;

    render_summary(&summary);

    if summary.has_failures() {
        EXIT_FAILURES
    } else {
        EXIT_OK
    }
}

fn render_summary(summary: &RunSummary) {
    for outcome in summary.outcomes() {
        println!("{}: {}", outcome.repository, outcome.status);
    }
    if !summary.is_empty() {
        println!(
            "{} repositories processed, {} failed",
            summary.len(),
            summary.failed_count()
        );
    }
}
