//! Groups declared resources by kind.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};
use stackfixture_common::types::ResourceKind;

use crate::document::ConfigDocument;

/// Declared properties of one resource definition.
pub type Properties = Mapping;

/// Resource kind to the property maps declared for it, in declaration order.
///
/// Declaration names are not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGroups {
    groups: BTreeMap<ResourceKind, Vec<Properties>>,
}

impl ResourceGroups {
    /// Property maps declared for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&[Properties]> {
        self.groups.get(&kind).map(Vec::as_slice)
    }

    /// Takes the definitions of `kind` out of the groups.
    pub fn remove(&mut self, kind: ResourceKind) -> Option<Vec<Properties>> {
        self.groups.remove(&kind)
    }

    /// Kinds with at least one definition, in registry order.
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.groups.keys().copied()
    }

    /// Returns `true` when no registered kind is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct kinds present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Total number of definitions across all kinds.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    fn push(&mut self, kind: ResourceKind, properties: Properties) {
        self.groups.entry(kind).or_default().push(properties);
    }
}

/// Classifies a `Resources` block.
///
/// Definitions of unregistered kinds are dropped. Definitions that are not
/// mappings or carry no string `Type` are skipped with a warning.
#[must_use]
pub fn classify(resources: Option<&Mapping>) -> ResourceGroups {
    let mut groups = ResourceGroups::default();
    let Some(resources) = resources else {
        return groups;
    };
    for (name, definition) in resources {
        let name = name.as_str().unwrap_or("<non-string>");
        let Some(definition) = definition.as_mapping() else {
            tracing::warn!(resource = name, "resource definition is not a mapping, skipping");
            continue;
        };
        let Some(tag) = definition.get("Type").and_then(Value::as_str) else {
            tracing::warn!(resource = name, "resource definition has no Type, skipping");
            continue;
        };
        let Some(kind) = ResourceKind::from_tag(tag) else {
            tracing::debug!(resource = name, tag, "no handler registered for resource type");
            continue;
        };
        let properties = match definition.get("Properties") {
            Some(Value::Mapping(properties)) => properties.clone(),
            Some(Value::Null) | None => Mapping::new(),
            Some(other) => {
                tracing::warn!(resource = name, ?other, "Properties is not a mapping, ignoring it");
                Mapping::new()
            }
        };
        tracing::trace!(resource = name, %kind, "classified resource");
        groups.push(kind, properties);
    }
    groups
}

/// Classifies the `resources.Resources` block of a document.
#[must_use]
pub fn classify_document(document: &ConfigDocument) -> ResourceGroups {
    classify(document.resources())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_of(text: &str) -> ResourceGroups {
        let doc = ConfigDocument::from_text(text).unwrap();
        classify_document(&doc)
    }

    #[test]
    fn groups_preserve_declaration_order() {
        let groups = groups_of(
            "\
resources:
  Resources:
    First:
      Type: AWS::DynamoDB::Table
      Properties:
        TableName: first
    Inbox:
      Type: AWS::SQS::Queue
      Properties:
        QueueName: inbox
    Second:
      Type: AWS::DynamoDB::Table
      Properties:
        TableName: second
",
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.resource_count(), 3);
        let tables: Vec<&str> = groups
            .get(ResourceKind::TableStore)
            .unwrap()
            .iter()
            .filter_map(|p| p.get("TableName").and_then(Value::as_str))
            .collect();
        assert_eq!(tables, ["first", "second"]);
    }

    #[test]
    fn unknown_kinds_are_dropped() {
        let groups = groups_of(
            "\
resources:
  Resources:
    Fn:
      Type: AWS::Lambda::Function
      Properties:
        FunctionName: f
",
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn kinds_follow_registry_order() {
        let groups = groups_of(
            "\
resources:
  Resources:
    Key:
      Type: AWS::KMS::Key
    Topic:
      Type: AWS::SNS::Topic
      Properties:
        TopicName: t
    Table:
      Type: AWS::DynamoDB::Table
",
        );
        let kinds: Vec<ResourceKind> = groups.kinds().collect();
        assert_eq!(
            kinds,
            [ResourceKind::TableStore, ResourceKind::Topic, ResourceKind::EncryptionKey]
        );
        assert!(groups.get(ResourceKind::EncryptionKey).unwrap()[0].is_empty());
    }

    #[test]
    fn malformed_definitions_are_skipped() {
        let groups = groups_of(
            "\
resources:
  Resources:
    Scalar: nope
    NoType:
      Properties:
        QueueName: q
    Queue:
      Type: AWS::SQS::Queue
      Properties:
        QueueName: q
",
        );
        assert_eq!(groups.resource_count(), 1);
    }

    #[test]
    fn missing_block_is_empty() {
        assert!(classify(None).is_empty());
    }

    #[test]
    fn remove_takes_a_kind_out() {
        let mut groups = groups_of(
            "resources:\n  Resources:\n    Q:\n      Type: AWS::SQS::Queue\n",
        );
        assert_eq!(groups.remove(ResourceKind::Queue).map(|v| v.len()), Some(1));
        assert!(groups.is_empty());
    }
}
