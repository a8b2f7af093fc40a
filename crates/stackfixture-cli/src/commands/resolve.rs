//! `stackfix resolve` — Print the document after variable resolution.

use clap::Args;
use stackfixture_common::config::FixtureConfig;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Print the parsed document as JSON instead of the resolved text.
    #[arg(long)]
    pub json: bool,

    /// Print only the value at this dot-separated path.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

/// Executes the `resolve` command.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded, the path is unknown,
/// or the output cannot be serialized.
pub fn execute(args: &ResolveArgs, config: FixtureConfig) -> anyhow::Result<()> {
    let session = super::open_session(config)?;
    let document = session.document();

    let value = match &args.path {
        Some(path) => document
            .lookup(path)
            .ok_or_else(|| anyhow::anyhow!("no value at path {path}"))?,
        None if !args.json => {
            print!("{}", document.resolved_text());
            return Ok(());
        }
        None => document.root(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", serde_yaml::to_string(value)?);
    }
    Ok(())
}
