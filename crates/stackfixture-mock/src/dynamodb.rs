//! Table-store mock (`dynamodb`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackfixture_common::constants::MOCK_ACCOUNT_ID;
use stackfixture_common::error::BackendError;

use crate::service::Service;
use crate::Tag;

const SERVICE: &str = "dynamodb";

/// A table row: attribute name to attribute value.
pub type Item = BTreeMap<String, Value>;

/// One element of a table's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// Attribute forming this key part.
    pub attribute_name: String,
    /// `HASH` or `RANGE`.
    pub key_type: String,
}

/// Declared type of a key attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    /// Attribute name.
    pub attribute_name: String,
    /// `S`, `N`, or `B`.
    pub attribute_type: String,
}

/// Provisioned read and write capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    /// Read capacity units.
    pub read_capacity_units: u64,
    /// Write capacity units.
    pub write_capacity_units: u64,
}

/// A global or local secondary index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecondaryIndex {
    /// Index name.
    pub index_name: String,
    /// Index key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Projected attributes, kept opaque.
    #[serde(default)]
    pub projection: Option<Value>,
    /// Index capacity (global indexes only).
    #[serde(default)]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

/// Change-stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamSpecification {
    /// Whether the stream is on. The backend requires it to be set.
    #[serde(default)]
    pub stream_enabled: Option<bool>,
    /// What each stream record carries.
    #[serde(default)]
    pub stream_view_type: Option<String>,
}

/// Server-side encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseSpecification {
    /// Whether encryption is on.
    #[serde(rename = "SSEEnabled", default)]
    pub enabled: Option<bool>,
    /// `AES256` or `KMS`.
    #[serde(rename = "SSEType", default)]
    pub sse_type: Option<String>,
    /// Customer key identifier.
    #[serde(rename = "KMSMasterKeyId", default)]
    pub kms_master_key_id: Option<String>,
}

/// Parameters of `CreateTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTableInput {
    /// Table name.
    pub table_name: String,
    /// Primary key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Types of key attributes.
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// `PROVISIONED` or `PAY_PER_REQUEST`.
    #[serde(default)]
    pub billing_mode: Option<String>,
    /// Table capacity.
    #[serde(default)]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    /// Global secondary indexes.
    #[serde(default)]
    pub global_secondary_indexes: Vec<SecondaryIndex>,
    /// Local secondary indexes.
    #[serde(default)]
    pub local_secondary_indexes: Vec<SecondaryIndex>,
    /// Change stream.
    #[serde(default)]
    pub stream_specification: Option<StreamSpecification>,
    /// Encryption at rest.
    #[serde(rename = "SSESpecification", default)]
    pub sse_specification: Option<SseSpecification>,
    /// Resource tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Result of `DescribeTable`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    /// Table name.
    pub table_name: String,
    /// Table ARN.
    pub table_arn: String,
    /// Always `ACTIVE` in the mock.
    pub table_status: &'static str,
    /// Number of stored items.
    pub item_count: usize,
    /// Primary key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Stream ARN when a stream is enabled.
    pub latest_stream_arn: Option<String>,
    /// Creation time.
    pub creation_date_time: DateTime<Utc>,
}

#[derive(Debug)]
struct Table {
    input: CreateTableInput,
    arn: String,
    stream_arn: Option<String>,
    items: BTreeMap<String, Item>,
    created_at: DateTime<Utc>,
}

impl Table {
    fn key_of(&self, item: &Item) -> Result<String, BackendError> {
        let mut parts = Vec::with_capacity(self.input.key_schema.len());
        for element in &self.input.key_schema {
            let value = item.get(&element.attribute_name).ok_or_else(|| {
                BackendError::Validation {
                    service: SERVICE,
                    message: format!(
                        "item is missing key attribute {}",
                        element.attribute_name
                    ),
                }
            })?;
            parts.push(value.to_string());
        }
        Ok(parts.join("\u{1f}"))
    }
}

/// Mocked table store.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    service: Service<BTreeMap<String, Table>>,
    region: String,
}

impl DynamoDb {
    pub(crate) fn new(region: &str) -> Self {
        Self {
            service: Service::new(SERVICE),
            region: region.to_owned(),
        }
    }

    /// Activates the service. Returns `false` if it was already active.
    pub fn activate(&self) -> bool {
        self.service.start()
    }

    /// Deactivates the service, discarding every table.
    pub fn deactivate(&self) {
        self.service.stop();
    }

    /// Returns whether the service is active.
    pub fn is_active(&self) -> bool {
        self.service.is_active()
    }

    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table exists, a key attribute is undeclared,
    /// or a stream specification does not set `StreamEnabled`.
    pub fn create_table(&self, input: CreateTableInput) -> Result<TableDescription, BackendError> {
        validate_table(&input)?;
        let arn = format!(
            "arn:aws:dynamodb:{}:{MOCK_ACCOUNT_ID}:table/{}",
            self.region, input.table_name
        );
        self.service.with(|tables| {
            if tables.contains_key(&input.table_name) {
                return Err(BackendError::AlreadyExists {
                    service: SERVICE,
                    kind: "table",
                    id: input.table_name.clone(),
                });
            }
            let created_at = Utc::now();
            let stream_arn = input
                .stream_specification
                .as_ref()
                .filter(|spec| spec.stream_enabled == Some(true))
                .map(|_| format!("{arn}/stream/{}", created_at.format("%Y-%m-%dT%H:%M:%S%.3f")));
            let name = input.table_name.clone();
            let table = Table {
                input,
                arn,
                stream_arn,
                items: BTreeMap::new(),
                created_at,
            };
            let description = describe(&table);
            let _ = tables.insert(name, table);
            Ok(description)
        })
    }

    /// Describes a table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the table does not exist.
    pub fn describe_table(&self, name: &str) -> Result<TableDescription, BackendError> {
        self.service
            .with(|tables| lookup(tables, name).map(describe))
    }

    /// Deletes a table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the table does not exist.
    pub fn delete_table(&self, name: &str) -> Result<(), BackendError> {
        self.service.with(|tables| {
            tables.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
        })
    }

    /// Lists table names in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is inactive.
    pub fn list_tables(&self) -> Result<Vec<String>, BackendError> {
        self.service.with(|tables| Ok(tables.keys().cloned().collect()))
    }

    /// Inserts or replaces an item by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or the item lacks a key
    /// attribute.
    pub fn put_item(&self, name: &str, item: Item) -> Result<(), BackendError> {
        self.service.with(|tables| {
            let table = tables.get_mut(name).ok_or_else(|| not_found(name))?;
            let key = table.key_of(&item)?;
            let _ = table.items.insert(key, item);
            Ok(())
        })
    }

    /// Returns every item in key order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the table does not exist.
    pub fn scan(&self, name: &str) -> Result<Vec<Item>, BackendError> {
        self.service
            .with(|tables| Ok(lookup(tables, name)?.items.values().cloned().collect()))
    }
}

fn validate_table(input: &CreateTableInput) -> Result<(), BackendError> {
    if input.key_schema.is_empty() {
        return Err(BackendError::Validation {
            service: SERVICE,
            message: "KeySchema must not be empty".into(),
        });
    }
    for element in &input.key_schema {
        let declared = input
            .attribute_definitions
            .iter()
            .any(|def| def.attribute_name == element.attribute_name);
        if !declared {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: format!(
                    "key attribute {} has no attribute definition",
                    element.attribute_name
                ),
            });
        }
    }
    if let Some(spec) = &input.stream_specification {
        if spec.stream_enabled.is_none() {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: "StreamSpecification requires StreamEnabled".into(),
            });
        }
    }
    Ok(())
}

fn lookup<'a>(tables: &'a BTreeMap<String, Table>, name: &str) -> Result<&'a Table, BackendError> {
    tables.get(name).ok_or_else(|| not_found(name))
}

fn not_found(name: &str) -> BackendError {
    BackendError::NotFound {
        service: SERVICE,
        kind: "table",
        id: name.to_owned(),
    }
}

fn describe(table: &Table) -> TableDescription {
    TableDescription {
        table_name: table.input.table_name.clone(),
        table_arn: table.arn.clone(),
        table_status: "ACTIVE",
        item_count: table.items.len(),
        key_schema: table.input.key_schema.clone(),
        latest_stream_arn: table.stream_arn.clone(),
        creation_date_time: table.created_at,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn simple_table(name: &str) -> CreateTableInput {
        CreateTableInput {
            table_name: name.into(),
            key_schema: vec![KeySchemaElement {
                attribute_name: "id".into(),
                key_type: "HASH".into(),
            }],
            attribute_definitions: vec![AttributeDefinition {
                attribute_name: "id".into(),
                attribute_type: "S".into(),
            }],
            billing_mode: Some("PAY_PER_REQUEST".into()),
            provisioned_throughput: None,
            global_secondary_indexes: Vec::new(),
            local_secondary_indexes: Vec::new(),
            stream_specification: None,
            sse_specification: None,
            tags: Vec::new(),
        }
    }

    fn active() -> DynamoDb {
        let db = DynamoDb::new("us-east-1");
        let _ = db.activate();
        db
    }

    #[test]
    fn create_then_describe() {
        let db = active();
        let created = db.create_table(simple_table("orders")).unwrap();
        assert_eq!(
            created.table_arn,
            "arn:aws:dynamodb:us-east-1:123456789012:table/orders"
        );
        let described = db.describe_table("orders").unwrap();
        assert_eq!(described.item_count, 0);
        assert_eq!(described.table_status, "ACTIVE");
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let db = active();
        let _ = db.create_table(simple_table("orders")).unwrap();
        let err = db.create_table(simple_table("orders")).unwrap_err();
        assert!(matches!(err, BackendError::AlreadyExists { .. }));
    }

    #[test]
    fn put_replaces_by_key() {
        let db = active();
        let _ = db.create_table(simple_table("orders")).unwrap();
        let mut item = Item::new();
        let _ = item.insert("id".into(), json!("a"));
        db.put_item("orders", item.clone()).unwrap();
        let _ = item.insert("total".into(), json!(3));
        db.put_item("orders", item).unwrap();
        let rows = db.scan("orders").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["total"], json!(3));
    }

    #[test]
    fn put_without_key_is_rejected() {
        let db = active();
        let _ = db.create_table(simple_table("orders")).unwrap();
        let err = db.put_item("orders", Item::new()).unwrap_err();
        assert!(err.to_string().contains("key attribute id"), "got: {err}");
    }

    #[test]
    fn undeclared_key_attribute_is_rejected() {
        let db = active();
        let mut input = simple_table("orders");
        input.attribute_definitions.clear();
        assert!(matches!(
            db.create_table(input),
            Err(BackendError::Validation { .. })
        ));
    }

    #[test]
    fn stream_requires_enabled_flag() {
        let db = active();
        let mut input = simple_table("events");
        input.stream_specification = Some(StreamSpecification {
            stream_enabled: None,
            stream_view_type: Some("NEW_IMAGE".into()),
        });
        assert!(db.create_table(input.clone()).is_err());

        input.stream_specification = Some(StreamSpecification {
            stream_enabled: Some(true),
            stream_view_type: Some("NEW_IMAGE".into()),
        });
        let created = db.create_table(input).unwrap();
        assert!(created.latest_stream_arn.is_some());
    }

    #[test]
    fn delete_then_describe_is_not_found() {
        let db = active();
        let _ = db.create_table(simple_table("orders")).unwrap();
        db.delete_table("orders").unwrap();
        assert!(db.describe_table("orders").unwrap_err().is_not_found());
    }

    #[test]
    fn input_deserializes_from_declared_properties() {
        let input: CreateTableInput = serde_json::from_value(json!({
            "TableName": "t",
            "KeySchema": [{"AttributeName": "pk", "KeyType": "HASH"}],
            "AttributeDefinitions": [{"AttributeName": "pk", "AttributeType": "S"}],
            "SSESpecification": {"SSEEnabled": true},
            "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 2}
        }))
        .unwrap();
        assert_eq!(input.sse_specification.unwrap().enabled, Some(true));
        assert_eq!(input.provisioned_throughput.unwrap().write_capacity_units, 2);
    }
}
