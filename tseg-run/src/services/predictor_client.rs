//! External segmentation predictor client
//!
//! The predictor is an opaque command-line tool:
//!
//! ```text
//! nnUNet_predict -i <input_dir> -o <output_dir> -t <model_id> -f <fold>
//! ```
//!
//! It is run directly (no shell), its output is captured, and a non-zero
//! exit status is reported as [`PredictorError::InferenceFailed`].
//!
//! On unix the child gets its own process group, so a terminal Ctrl+C
//! reaches only the runner and a started inference runs to completion.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Lines of predictor output kept in error reports
const OUTPUT_TAIL_LINES: usize = 20;

/// Predictor errors
#[derive(Debug, Error)]
pub enum PredictorError {
    /// Predictor executable not found
    #[error("Predictor binary not found: {0}")]
    BinaryNotFound(String),

    /// Failed to start the predictor process
    #[error("Failed to launch predictor: {0}")]
    Launch(String),

    /// Predictor ran and exited unsuccessfully
    #[error("Inference failed (exit status {}): {output}", exit_label(.code))]
    InferenceFailed { code: Option<i32>, output: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Inputs of one predictor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub model_id: String,
    pub fold: String,
}

impl PredictionRequest {
    /// Command-line arguments in predictor order
    pub fn to_args(&self) -> Vec<OsString> {
        vec![
            "-i".into(),
            self.input_dir.clone().into_os_string(),
            "-o".into(),
            self.output_dir.clone().into_os_string(),
            "-t".into(),
            self.model_id.clone().into(),
            "-f".into(),
            self.fold.clone().into(),
        ]
    }
}

/// Captured result of a successful invocation
#[derive(Debug, Clone, Default)]
pub struct PredictionOutput {
    pub stdout: String,
    pub stderr: String,
}

impl PredictionOutput {
    /// Last `n` non-empty lines of stdout
    pub fn stdout_tail(&self, n: usize) -> String {
        tail_lines(&self.stdout, n)
    }
}

/// Narrow interface to the external segmentation tool
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Predictor identifier for logs
    fn name(&self) -> &str;

    /// Printable command line for a request
    fn command_line(&self, request: &PredictionRequest) -> String;

    /// Run inference and wait for it to finish
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutput, PredictorError>;
}

/// Client for the nnU-Net `nnUNet_predict` command
#[derive(Debug, Clone)]
pub struct NnUnetPredictor {
    binary: String,
}

impl NnUnetPredictor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Check whether the binary can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-h")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }
}

#[async_trait]
impl Predictor for NnUnetPredictor {
    fn name(&self) -> &str {
        "nnUNet"
    }

    fn command_line(&self, request: &PredictionRequest) -> String {
        let mut parts = vec![self.binary.clone()];
        parts.extend(
            request
                .to_args()
                .into_iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutput, PredictorError> {
        tracing::debug!(
            binary = %self.binary,
            model = %request.model_id,
            input = %request.input_dir.display(),
            output = %request.output_dir.display(),
            "Running predictor"
        );

        let mut command = Command::new(&self.binary);
        command.args(request.to_args()).stdin(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        let output = command
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PredictorError::BinaryNotFound(self.binary.clone()),
                _ => PredictorError::Launch(e.to_string()),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(PredictorError::InferenceFailed {
                code: output.status.code(),
                output: tail_lines(detail, OUTPUT_TAIL_LINES),
            });
        }

        tracing::debug!(
            model = %request.model_id,
            stdout_bytes = stdout.len(),
            "Predictor finished"
        );

        Ok(PredictionOutput { stdout, stderr })
    }
}

/// Last `n` non-empty lines of `text`
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
