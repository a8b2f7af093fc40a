//! Session-scoped ownership of the resolved document.

use stackfixture_common::config::FixtureConfig;
use stackfixture_common::error::Result;

use crate::classifier::{self, ResourceGroups};
use crate::document::ConfigDocument;
use crate::loader;

/// One test session: the configuration and the document it produced.
///
/// Built once, before any test runs, and borrowed by every orchestrator.
/// Nothing resets it implicitly.
#[derive(Debug, Clone)]
pub struct Session {
    config: FixtureConfig,
    document: ConfigDocument,
}

impl Session {
    /// Loads and resolves the configured document.
    ///
    /// `config` is used as given; environment overrides are applied by
    /// [`FixtureConfig::load`] or [`Session::from_environment`].
    ///
    /// # Errors
    ///
    /// Returns a configuration-level error (missing file, missing renderer,
    /// malformed document) before any resource is touched.
    pub fn initialize(config: FixtureConfig) -> Result<Self> {
        config.validate()?;
        let document = loader::load_document(&config)?;
        Ok(Self { config, document })
    }

    /// Loads the default configuration with `STACKFIXTURE_FILE` and
    /// `STACKFIXTURE_RENDER_COMMAND` applied.
    ///
    /// # Errors
    ///
    /// Same as [`Session::initialize`].
    pub fn from_environment() -> Result<Self> {
        let mut config = FixtureConfig::default();
        config.apply_env_overrides();
        Self::initialize(config)
    }

    /// Wraps an already-built document.
    #[must_use]
    pub const fn from_document(config: FixtureConfig, document: ConfigDocument) -> Self {
        Self { config, document }
    }

    /// The resolved document.
    #[must_use]
    pub const fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// The configuration this session was built from.
    #[must_use]
    pub const fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Fresh resource groups for one test invocation.
    #[must_use]
    pub fn resource_groups(&self) -> ResourceGroups {
        classifier::classify_document(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use stackfixture_common::config::DocumentSource;
    use stackfixture_common::error::FixtureError;
    use stackfixture_common::types::ResourceKind;

    use super::*;

    #[test]
    #[serial_test::serial]
    #[allow(unsafe_code)]
    fn from_environment_honours_document_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.yml");
        std::fs::write(&path, "service: from-env\n").unwrap();
        // SAFETY: serialized test; no other thread touches the environment.
        unsafe {
            std::env::remove_var("STACKFIXTURE_RENDER_COMMAND");
            std::env::set_var("STACKFIXTURE_FILE", &path);
        }
        let session = Session::from_environment();
        // SAFETY: test cleanup, still serialized.
        unsafe { std::env::remove_var("STACKFIXTURE_FILE") };
        let session = session.unwrap();
        assert_eq!(session.document().service(), Some("from-env"));
        assert_eq!(session.config().source, DocumentSource::File(path));
    }

    #[test]
    fn initialize_reads_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serverless.yml");
        std::fs::write(
            &path,
            "service: svc\nresources:\n  Resources:\n    Q:\n      Type: AWS::SQS::Queue\n      Properties:\n        QueueName: ${self:service}-q\n",
        )
        .unwrap();
        let session = Session::initialize(FixtureConfig::from_path(&path)).unwrap();
        assert_eq!(session.document().service(), Some("svc"));
        let groups = session.resource_groups();
        assert_eq!(groups.get(ResourceKind::Queue).map(<[_]>::len), Some(1));
    }

    #[test]
    fn each_call_yields_independent_groups() {
        let doc = ConfigDocument::from_text(
            "resources:\n  Resources:\n    K:\n      Type: AWS::KMS::Key\n",
        )
        .unwrap();
        let session = Session::from_document(FixtureConfig::default(), doc);
        let mut first = session.resource_groups();
        let _ = first.remove(ResourceKind::EncryptionKey);
        assert!(first.is_empty());
        assert_eq!(session.resource_groups().len(), 1);
    }

    #[test]
    fn missing_file_fails_before_tests() {
        let dir = tempfile::tempdir().unwrap();
        let config = FixtureConfig {
            source: DocumentSource::File(dir.path().join("absent.yml")),
            ..FixtureConfig::default()
        };
        let err = Session::initialize(config).unwrap_err();
        assert!(matches!(err, FixtureError::MissingConfig { .. }));
    }
}
