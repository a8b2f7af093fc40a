//! # stackfix — stackfixture CLI
//!
//! Resolves declarative documents, shows which mocked resources they
//! declare, and runs a full setup/teardown cycle against the mocks.

#![allow(clippy::print_stdout)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

mod commands;
mod output;

use clap::Parser;
use stackfixture_common::constants::APP_NAME;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(app = APP_NAME, version = env!("CARGO_PKG_VERSION"), "starting");
    commands::execute(cli)
}
