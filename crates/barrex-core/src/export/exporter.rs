//! Export stage: spawn the Python exporter and relocate the artifact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::scripts;
use super::types::{ExportRequest, ScriptEventLine};
use crate::config::{PythonConfig, SubprocessConfig};
use crate::{BarrexError, Result};

/// The export capability.
///
/// Abstracts the underlying exporter's call signature so callers and tests
/// are not coupled to the ultralytics toolchain.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Produce an artifact at the request's resolved output path.
    async fn export(&self, request: &ExportRequest) -> Result<PathBuf>;
}

/// Exporter backed by the embedded ultralytics Python script.
pub struct UltralyticsExporter {
    scripts_dir: PathBuf,
}

impl UltralyticsExporter {
    pub fn new() -> Self {
        Self {
            scripts_dir: scripts::scripts_dir(),
        }
    }

    /// Use a custom script deployment directory (tests, sandboxes).
    pub fn with_scripts_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: dir.into(),
        }
    }
}

impl Default for UltralyticsExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exporter for UltralyticsExporter {
    async fn export(&self, request: &ExportRequest) -> Result<PathBuf> {
        if !request.model_path.is_file() {
            return Err(BarrexError::FileNotFound(request.model_path.clone()));
        }

        let script_path = scripts::ensure_script_deployed(&self.scripts_dir)?;
        let args = build_script_args(request);

        info!(
            "Exporting {} (profile {}, opset {})",
            request.model_path.display(),
            request.profile,
            request.profile.opset()
        );

        let mut child = Command::new(PythonConfig::binary())
            .arg(&script_path)
            .args(&args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BarrexError::ExportFailed {
                message: format!("Failed to spawn export process: {e}"),
            })?;

        let run = run_export_process(&mut child);
        let (script_error, produced_path) =
            match tokio::time::timeout(SubprocessConfig::EXPORT_TIMEOUT, run).await {
                Ok(result) => result?,
                Err(_) => {
                    child.kill().await.ok();
                    return Err(BarrexError::ExportFailed {
                        message: format!(
                            "Export timed out after {:?}",
                            SubprocessConfig::EXPORT_TIMEOUT
                        ),
                    });
                }
            };

        if let Some(message) = script_error {
            return Err(BarrexError::ExportFailed { message });
        }

        // The exporter drops the artifact next to the checkpoint unless the
        // complete event told us otherwise.
        let produced = produced_path.unwrap_or_else(|| request.default_artifact_path());
        if !produced.is_file() {
            return Err(BarrexError::ExportFailed {
                message: format!(
                    "Exporter finished but no artifact found at {}",
                    produced.display()
                ),
            });
        }

        let output = request.resolved_output();
        finalize_artifact(&produced, &output)?;
        info!("Artifact written to {}", output.display());
        Ok(output)
    }
}

/// Stream the child's stdout JSON lines while a spawned task drains stderr,
/// then check the exit status. Returns the script's error message (if it
/// emitted one) and the artifact path from the `complete` event.
async fn run_export_process(
    child: &mut tokio::process::Child,
) -> Result<(Option<String>, Option<PathBuf>)> {
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    let mut reader = BufReader::new(stdout).lines();

    // Drain stderr concurrently so a chatty exporter cannot fill the pipe
    // and stall; keep a short tail for error reporting.
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("export stderr: {}", line);
            if tail.len() == 3 {
                tail.remove(0);
            }
            tail.push(line);
        }
        tail.join(" | ")
    });

    let mut script_error = None;
    let mut produced_path = None;

    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                let Ok(event) = serde_json::from_str::<ScriptEventLine>(&line) else {
                    debug!("Non-JSON output from export script: {}", line);
                    continue;
                };
                if let Some(ref message) = event.message {
                    info!("[{}] {}", event.stage, message);
                }
                if event.is_error() {
                    script_error = event.message.clone();
                } else if event.is_complete() {
                    produced_path = event.output_path.as_deref().map(PathBuf::from);
                    if let Some(size) = event.output_size {
                        debug!("Exporter reported artifact size: {} bytes", size);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error reading export output: {}", e);
                break;
            }
        }
    }

    let stderr_tail = stderr_task.await.unwrap_or_default();

    let status = child.wait().await.map_err(|e| BarrexError::ExportFailed {
        message: format!("Export process error: {e}"),
    })?;

    if !status.success() && script_error.is_none() {
        script_error = Some(format!(
            "Export process exited with status {}{}",
            status.code().unwrap_or(-1),
            if stderr_tail.is_empty() {
                String::new()
            } else {
                format!(": {stderr_tail}")
            }
        ));
    }

    Ok((script_error, produced_path))
}

/// Map a request onto the embedded script's argument list.
fn build_script_args(request: &ExportRequest) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        request.model_path.to_string_lossy().to_string(),
        "--img-size".to_string(),
        request.img_size.to_string(),
        "--batch".to_string(),
        request.batch_size.to_string(),
        "--opset".to_string(),
        request.profile.opset().to_string(),
    ];
    if request.dynamic {
        args.push("--dynamic".to_string());
    }
    if request.effective_simplify() {
        args.push("--simplify".to_string());
    }
    if request.effective_half() {
        args.push("--half".to_string());
    }
    args
}

/// Move the produced artifact to the resolved output path.
///
/// Creates the output's parent directory first. Falls back to copy-and-remove
/// when a plain rename fails (cross-device moves).
pub fn finalize_artifact(produced: &Path, output: &Path) -> Result<()> {
    if produced == output {
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BarrexError::io("creating output directory", parent, e))?;
        }
    }

    if std::fs::rename(produced, output).is_err() {
        std::fs::copy(produced, output)
            .map_err(|e| BarrexError::io("copying artifact", output, e))?;
        std::fs::remove_file(produced)
            .map_err(|e| BarrexError::io("removing exporter artifact", produced, e))?;
    }
    Ok(())
}
