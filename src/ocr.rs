//! Optical character recognition over screenshots

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::OcrConfig;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to run OCR command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("OCR command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
}

/// Image bytes in, recognized text out
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Always yields empty text
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOcr;

#[async_trait]
impl OcrEngine for NoopOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Ok(String::new())
    }
}

/// Runs the `tesseract` CLI, feeding the image on stdin and reading text
/// from stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    async fn run(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|source| OcrError::Spawn {
                    command: self.command.clone(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| OcrError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        debug!("Running OCR on {} byte image", image.len());
        tokio::time::timeout(self.timeout, self.run(image))
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))?
    }
}
