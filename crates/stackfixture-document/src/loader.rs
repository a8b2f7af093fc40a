//! Obtains the raw declarative document text.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use stackfixture_common::config::{DocumentSource, FixtureConfig, RendererCommand};
use stackfixture_common::error::{FixtureError, Result};

use crate::document::ConfigDocument;

/// Reads the document text from the configured source.
///
/// # Errors
///
/// Returns [`FixtureError::MissingConfig`] for an absent file,
/// [`FixtureError::MissingTool`] for an absent renderer, or
/// [`FixtureError::RenderFailed`] if the renderer exits unsuccessfully.
pub fn read_source(source: &DocumentSource) -> Result<String> {
    match source {
        DocumentSource::File(path) => read_file(path),
        DocumentSource::Renderer(command) => render(command),
    }
}

/// Reads the configured source and builds a resolved document from it.
///
/// # Errors
///
/// Returns any error from [`read_source`], or
/// [`FixtureError::MalformedDocument`] if the text is not a YAML mapping.
pub fn load_document(config: &FixtureConfig) -> Result<ConfigDocument> {
    let raw = read_source(&config.source)?;
    let document = ConfigDocument::from_text(raw)?;
    tracing::info!(
        service = document.service().unwrap_or("<unnamed>"),
        "declarative document loaded"
    );
    Ok(document)
}

fn read_file(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading declarative document");
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FixtureError::MissingConfig {
            path: path.to_path_buf(),
        },
        _ => FixtureError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

fn render(command: &RendererCommand) -> Result<String> {
    let program = which::which(&command.program).map_err(|e| FixtureError::MissingTool {
        program: command.program.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!(program = %program.display(), args = ?command.args, "rendering document");

    let mut cmd = Command::new(&program);
    let _ = cmd.args(&command.args);
    if let Some(dir) = &command.working_dir {
        let _ = cmd.current_dir(dir);
    }
    let output = cmd.output().map_err(|e| FixtureError::Io {
        path: program.clone(),
        source: e,
    })?;

    if !output.status.success() {
        return Err(FixtureError::RenderFailed {
            program: command.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    let stdout = String::from_utf8(output.stdout).map_err(|e| FixtureError::MalformedDocument {
        message: format!("renderer output is not UTF-8: {e}"),
    })?;
    Ok(drop_banner(&stdout).to_owned())
}

/// Drops the first line of renderer output.
fn drop_banner(output: &str) -> &str {
    output.split_once('\n').map_or("", |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn sh(script: &str) -> DocumentSource {
        DocumentSource::Renderer(RendererCommand {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: None,
        })
    }

    #[test]
    fn reads_document_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service: from-file").unwrap();
        let config = FixtureConfig {
            source: DocumentSource::File(file.path().to_path_buf()),
            ..FixtureConfig::default()
        };
        let doc = load_document(&config).unwrap();
        assert_eq!(doc.service(), Some("from-file"));
    }

    #[test]
    fn absent_file_is_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serverless.yml");
        let err = read_source(&DocumentSource::File(path.clone())).unwrap_err();
        assert!(matches!(err, FixtureError::MissingConfig { path: p } if p == path));
    }

    #[test]
    fn absent_renderer_is_missing_tool() {
        let source = DocumentSource::Renderer(RendererCommand {
            program: "stackfixture-no-such-renderer".into(),
            args: Vec::new(),
            working_dir: None,
        });
        let err = read_source(&source).unwrap_err();
        assert!(matches!(err, FixtureError::MissingTool { .. }));
    }

    #[test]
    fn renderer_banner_line_is_dropped() {
        let text = read_source(&sh("printf 'Running print\\nservice: rendered\\n'")).unwrap();
        assert_eq!(text, "service: rendered\n");
    }

    #[test]
    fn renderer_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.yml"), "banner\nservice: in-dir\n").unwrap();
        let source = DocumentSource::Renderer(RendererCommand {
            program: "cat".into(),
            args: vec!["doc.yml".into()],
            working_dir: Some(dir.path().to_path_buf()),
        });
        assert_eq!(read_source(&source).unwrap(), "service: in-dir\n");
    }

    #[test]
    fn failing_renderer_reports_stderr() {
        let err = read_source(&sh("echo boom >&2; exit 3")).unwrap_err();
        match err {
            FixtureError::RenderFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn drop_banner_handles_single_line() {
        assert_eq!(drop_banner("only"), "");
        assert_eq!(drop_banner("a\nb\nc"), "b\nc");
    }
}
