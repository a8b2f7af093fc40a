//! CLI command definitions and dispatch.

pub mod check;
pub mod plan;
pub mod resolve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use stackfixture_common::config::{DocumentSource, FixtureConfig, RendererCommand};
use stackfixture_common::constants::BIN_NAME;
use stackfixture_document::session::Session;

/// stackfixture — mocked cloud resources from declarative documents.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Where to read the document from.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Document source selection shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// TOML configuration file.
    #[arg(long, global = true, env = "STACKFIXTURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read the document from this file.
    #[arg(long, global = true, conflicts_with = "render")]
    pub file: Option<PathBuf>,

    /// Run this command and read the document from its output.
    #[arg(long, global = true, value_name = "CMD")]
    pub render: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the document after variable resolution.
    Resolve(resolve::ResolveArgs),
    /// List the resources each registered kind would create.
    Plan(plan::PlanArgs),
    /// Run a full setup/teardown cycle against fresh mocks.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli.source)?;
    match cli.command {
        Command::Resolve(args) => resolve::execute(&args, config),
        Command::Plan(args) => plan::execute(&args, config),
        Command::Check(args) => check::execute(&args, config),
    }
}

/// Layers flags over the config file (or defaults) and its env overrides.
fn build_config(source: &SourceArgs) -> anyhow::Result<FixtureConfig> {
    let mut config = match &source.config {
        Some(path) => FixtureConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            let mut config = FixtureConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(file) = &source.file {
        config.source = DocumentSource::File(file.clone());
    }
    if let Some(line) = &source.render {
        let command = RendererCommand::from_command_line(line)
            .context("--render needs a program to run")?;
        config.source = DocumentSource::Renderer(command);
    }
    Ok(config)
}

/// Loads the session every subcommand works from.
fn open_session(config: FixtureConfig) -> anyhow::Result<Session> {
    Session::initialize(config).context("loading declarative document")
}
