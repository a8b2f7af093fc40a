//! `stackfix plan` — Show which mocked resources a document declares.

use clap::Args;
use stackfixture_common::config::FixtureConfig;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_document::resolver;
use stackfixture_runtime::handlers::REGISTRY;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Also print each resource's declared properties.
    #[arg(long, short)]
    pub verbose: bool,
}

/// Property holding the identifier shown for each kind.
const fn name_property(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::TableStore => "TableName",
        ResourceKind::Queue => "QueueName",
        ResourceKind::ObjectBucket => "BucketName",
        ResourceKind::Topic => "TopicName",
        ResourceKind::EncryptionKey => "Description",
    }
}

/// Display label for one definition.
fn label(kind: ResourceKind, properties: &Properties) -> String {
    properties
        .get(name_property(kind))
        .filter(|value| !value.is_null())
        .and_then(resolver::identifier_from)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "<unnamed>".to_owned())
}

/// Executes the `plan` command.
///
/// Kinds are listed in the order the orchestrator sets them up.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded.
pub fn execute(args: &PlanArgs, config: FixtureConfig) -> anyhow::Result<()> {
    let session = super::open_session(config)?;
    let groups = session.resource_groups();
    let service = session.document().service().unwrap_or("<unnamed service>");

    output::print_heading(&format!("Fixture plan for: {service}"));

    for (kind, _) in REGISTRY {
        let Some(definitions) = groups.get(*kind) else {
            continue;
        };
        println!("  {kind} ({})", kind.service());
        for properties in definitions {
            println!("    + {}", label(*kind, properties));
            if args.verbose {
                for (key, value) in properties {
                    let key = key.as_str().unwrap_or("?");
                    let value = resolver::canonical_string(value).unwrap_or_default();
                    println!("        {key}: {value}");
                }
            }
        }
    }

    println!();
    println!(
        "  {} across {} will be created.",
        output::count_of(groups.resource_count(), "resource"),
        output::count_of(groups.len(), "kind"),
    );
    let environment = session.document().provider_environment();
    if !environment.is_empty() {
        println!();
        println!("  Environment:");
        for binding in &environment {
            println!("    {}={}", binding.key, binding.rendered_value());
        }
    }
    Ok(())
}
