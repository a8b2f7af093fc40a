//! Table-store handler.

use serde_yaml::{Mapping, Value};
use stackfixture_common::error::Result;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;
use stackfixture_mock::dynamodb::{CreateTableInput, DynamoDb};

use super::{ResourceHandler, into_result, record_failure};
use crate::properties::{self, PropertySet};

const PROPERTIES: PropertySet = PropertySet {
    kind: ResourceKind::TableStore,
    required: &["TableName", "KeySchema", "AttributeDefinitions"],
    optional: &[
        "BillingMode",
        "ProvisionedThroughput",
        "GlobalSecondaryIndexes",
        "LocalSecondaryIndexes",
        "StreamSpecification",
        "SSESpecification",
        "Tags",
    ],
};

/// Creates and removes declared tables.
#[derive(Debug)]
pub struct TableHandler {
    dynamodb: DynamoDb,
    definitions: Vec<Properties>,
    created: Vec<String>,
}

impl TableHandler {
    /// Registry factory.
    pub fn boxed(definitions: Vec<Properties>, cloud: &MockCloud) -> Box<dyn ResourceHandler> {
        Box::new(Self {
            dynamodb: cloud.dynamodb().clone(),
            definitions,
            created: Vec::new(),
        })
    }
}

/// Maps declared properties onto a `CreateTable` request.
///
/// The table name is sanitized and a declared stream specification is
/// always enabled.
fn create_table_input(declared: &Properties) -> Result<CreateTableInput> {
    let mut input = PROPERTIES.recognized(declared)?;
    let name = properties::identifier(&input, "TableName")
        .ok_or_else(|| PROPERTIES.setup_error("TableName resolves to an empty identifier"))?;
    let _ = input.insert("TableName".into(), Value::String(name));
    if let Some(stream) = input.get_mut("StreamSpecification") {
        if !stream.is_mapping() {
            *stream = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(spec) = stream {
            let _ = spec.insert("StreamEnabled".into(), Value::Bool(true));
        }
    }
    serde_yaml::from_value(Value::Mapping(input))
        .map_err(|e| PROPERTIES.setup_error(format!("invalid table definition: {e}")))
}

impl ResourceHandler for TableHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::TableStore
    }

    fn setup(&mut self) -> Result<()> {
        let _ = self.dynamodb.activate();
        for declared in &self.definitions {
            let input = create_table_input(declared)?;
            let description = self.dynamodb.create_table(input)?;
            tracing::debug!(table = %description.table_name, "table created");
            self.created.push(description.table_name);
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        let mut failure = None;
        for name in self.created.drain(..) {
            if let Err(e) = self.dynamodb.delete_table(&name) {
                record_failure(&mut failure, ResourceKind::TableStore, &name, e.into());
            }
        }
        self.dynamodb.deactivate();
        into_result(failure)
    }
}
