//! `stackfix check` — Set up and tear down every declared resource once.

use clap::Args;
use stackfixture_common::config::FixtureConfig;
use stackfixture_runtime::Orchestrator;

use crate::output;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Do not export `provider.environment` to this process.
    #[arg(long)]
    pub no_env: bool,
}

/// Executes the `check` command.
///
/// Builds fresh mocks in the document's region, runs the full lifecycle
/// with an empty body, and reports what was active in between.
///
/// # Errors
///
/// Returns an error if loading, setup, or teardown fails.
pub fn execute(args: &CheckArgs, mut config: FixtureConfig) -> anyhow::Result<()> {
    if args.no_env {
        config.apply_environment = false;
    }
    let session = super::open_session(config)?;
    let orchestrator = Orchestrator::for_session(&session);
    tracing::info!(region = orchestrator.cloud().region(), "running fixture check");

    let active = orchestrator
        .run(|cloud| cloud.active_services())
        .map_err(|e| anyhow::anyhow!("fixture cycle failed: {e}"))?;

    output::print_heading(&format!(
        "Fixture check for: {}",
        session.document().service().unwrap_or("<unnamed service>")
    ));
    for service in &active {
        println!("  \u{2713} {service}");
    }
    println!();
    println!(
        "  {} set up and torn down cleanly.",
        output::count_of(active.len(), "service")
    );
    Ok(())
}
