use crate::core::llm::LlmClient;
use crate::error::ConversionError;
use std::path::Path;
use std::process::Command;

/// What the converter is allowed to do for one file, decided once per request.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Text and document extraction only.
    Plain,
    /// Extraction followed by an LLM-written image description.
    Captioned { model: String, client: LlmClient },
}

impl Extraction {
    pub fn is_captioned(&self) -> bool {
        matches!(self, Extraction::Captioned { .. })
    }
}

/// The external document-to-Markdown capability. Calls block.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, path: &Path, extraction: &Extraction) -> Result<String, ConversionError>;
}

/// Runs the `markitdown` executable on the staged file and reads Markdown from stdout.
#[derive(Debug, Clone)]
pub struct MarkItDownCli {
    program: String,
}

impl MarkItDownCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn extract(&self, path: &Path) -> Result<String, ConversionError> {
        let output = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|source| ConversionError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(str::trim)
                .map(String::from)
                .unwrap_or_else(|| format!("`{}` exited with {}", self.program, output.status));
            tracing::warn!(path = %path.display(), stderr = %stderr.trim(), "converter failed");
            return Err(ConversionError::Failed(message));
        }

        String::from_utf8(output.stdout).map_err(|_| ConversionError::Encoding {
            path: path.to_path_buf(),
        })
    }
}

impl DocumentConverter for MarkItDownCli {
    fn convert(&self, path: &Path, extraction: &Extraction) -> Result<String, ConversionError> {
        let markdown = self.extract(path)?;
        match extraction {
            Extraction::Plain => Ok(markdown),
            Extraction::Captioned { model, client } => {
                let caption = client.caption(path, model)?;
                Ok(with_description(&markdown, &caption))
            }
        }
    }
}

fn with_description(markdown: &str, caption: &str) -> String {
    let body = markdown.trim_end();
    if body.is_empty() {
        format!("# Description:\n{caption}")
    } else {
        format!("{body}\n\n# Description:\n{caption}")
    }
}

#[cfg(test)]
mod converter_tests {
    use super::{DocumentConverter, Extraction, MarkItDownCli, with_description};
    use crate::error::ConversionError;

    #[test]
    fn test_with_description() {
        assert_eq!(with_description("", "a cat"), "# Description:\na cat");
        assert_eq!(
            with_description("ImageSize: 10x10\n", "a cat"),
            "ImageSize: 10x10\n\n# Description:\na cat"
        );
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let converter = MarkItDownCli::new("markitdown-web-no-such-binary");
        let err = converter
            .convert(std::path::Path::new("report.pdf"), &Extraction::Plain)
            .unwrap_err();
        assert!(matches!(err, ConversionError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_is_the_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nhello\n").unwrap();

        // `cat` stands in for an extractor that echoes the document
        let converter = MarkItDownCli::new("cat");
        let markdown = converter.convert(&path, &Extraction::Plain).unwrap();
        assert_eq!(markdown, "# Notes\n\nhello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");

        let converter = MarkItDownCli::new("cat");
        let err = converter.convert(&missing, &Extraction::Plain).unwrap_err();
        match err {
            ConversionError::Failed(message) => assert!(message.contains("gone.pdf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
