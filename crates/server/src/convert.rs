//! HTML to PDF conversion through a headless browser subprocess

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Converter exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Converter produced no output")]
    EmptyOutput,
}

/// Turns a complete HTML document into PDF bytes
///
/// Implementations block; callers run them off the async executor.
pub trait HtmlToPdf: Send + Sync {
    fn convert(&self, html: &str) -> Result<Vec<u8>, ConvertError>;
}

/// Chromium/Chrome in headless mode with `--print-to-pdf`
#[derive(Debug, Clone)]
pub struct ChromiumConverter {
    binary: PathBuf,
}

impl ChromiumConverter {
    pub fn new<P: AsRef<Path>>(binary: P) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    fn command(&self, html_path: &Path, pdf_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", html_path.display()));
        cmd
    }
}

impl HtmlToPdf for ChromiumConverter {
    fn convert(&self, html: &str) -> Result<Vec<u8>, ConvertError> {
        let dir = tempfile::tempdir()?;
        let html_path = dir.path().join("document.html");
        let pdf_path = dir.path().join("document.pdf");
        std::fs::write(&html_path, html)?;

        let mut cmd = self.command(&html_path, &pdf_path);
        log::debug!("running converter: {cmd:?}");
        let output = cmd.output()?;

        if !output.status.success() {
            return Err(ConvertError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = std::fs::read(&pdf_path)?;
        if bytes.is_empty() {
            return Err(ConvertError::EmptyOutput);
        }
        log::debug!("converter wrote {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arguments() {
        let converter = ChromiumConverter::new("/usr/bin/chromium");
        let cmd = converter.command(Path::new("/tmp/a/document.html"), Path::new("/tmp/a/out.pdf"));

        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "/usr/bin/chromium");
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--print-to-pdf=/tmp/a/out.pdf".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("file:///tmp/a/document.html"));
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let converter = ChromiumConverter::new("/nonexistent/chromium-binary");
        let err = converter.convert("<p>x</p>").unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
