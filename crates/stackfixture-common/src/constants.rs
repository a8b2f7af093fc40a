//! Workspace-wide constants and defaults.

/// Default declarative document, relative to the working directory.
pub const DEFAULT_DOCUMENT_FILE: &str = "serverless.yml";

/// Default renderer program used to print the effective configuration.
pub const DEFAULT_RENDER_PROGRAM: &str = "serverless";

/// Default renderer arguments.
pub const DEFAULT_RENDER_ARGS: &[&str] = &["print"];

/// Upper bound on self-reference substitution passes.
pub const MAX_RESOLUTION_PASSES: usize = 16;

/// Region used when the document's provider block declares none.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Account identifier embedded in mocked URLs and ARNs.
pub const MOCK_ACCOUNT_ID: &str = "123456789012";

/// Environment variable overriding the document path.
pub const ENV_DOCUMENT_FILE: &str = "STACKFIXTURE_FILE";

/// Environment variable selecting a renderer command line instead of a file.
pub const ENV_RENDER_COMMAND: &str = "STACKFIXTURE_RENDER_COMMAND";

/// Application name used in CLI output.
pub const APP_NAME: &str = "stackfixture";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "stackfix";
