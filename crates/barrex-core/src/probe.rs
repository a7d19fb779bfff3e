//! Dependency probe for the Python export toolchain.
//!
//! The export stage shells out to the `ultralytics` exporter, so before any
//! file I/O happens we confirm the interpreter exists and the required
//! modules import, and report their versions. A failed probe aborts the run;
//! it is never retried.

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::config::{PythonConfig, SubprocessConfig};
use crate::{BarrexError, Result};

/// Inline snippet run with `python -c`. Prints exactly one JSON line.
const PROBE_SNIPPET: &str = "\
import json
try:
    import torch
    import ultralytics
    print(json.dumps({'ok': True, 'torch': torch.__version__, 'ultralytics': ultralytics.__version__}))
except ImportError as e:
    print(json.dumps({'ok': False, 'missing': str(e)}))
";

const INSTALL_HINT: &str = "pip install torch ultralytics";

/// Versions of the resolved export toolchain.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub python_binary: String,
    pub torch_version: String,
    pub ultralytics_version: String,
}

#[derive(Deserialize)]
struct ProbeLine {
    ok: bool,
    #[serde(default)]
    torch: Option<String>,
    #[serde(default)]
    ultralytics: Option<String>,
    #[serde(default)]
    missing: Option<String>,
}

/// Check that the Python export toolchain is available.
///
/// Performs no file I/O. Returns the resolved versions on success, or
/// `ProbeFailed` naming the missing piece and a remediation hint.
pub async fn probe_toolchain() -> Result<ProbeReport> {
    let python = PythonConfig::binary();
    debug!("Probing export toolchain via {}", python);

    let output = tokio::time::timeout(
        SubprocessConfig::PROBE_TIMEOUT,
        Command::new(&python).args(["-c", PROBE_SNIPPET]).output(),
    )
    .await
    .map_err(|_| BarrexError::ProbeFailed {
        message: format!(
            "{} did not respond within {:?}",
            python,
            SubprocessConfig::PROBE_TIMEOUT
        ),
        hint: None,
    })?
    .map_err(|e| BarrexError::ProbeFailed {
        message: format!("Failed to run {python}: {e}"),
        hint: Some(format!(
            "Install Python 3 or point {} at an interpreter",
            PythonConfig::ENV_OVERRIDE
        )),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BarrexError::ProbeFailed {
            message: format!("{python} exited with {}: {}", output.status, stderr.trim()),
            hint: Some(INSTALL_HINT.to_string()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    let parsed: ProbeLine = serde_json::from_str(line).map_err(|e| BarrexError::ProbeFailed {
        message: format!("Unexpected probe output ({e}): {line}"),
        hint: None,
    })?;

    if !parsed.ok {
        return Err(BarrexError::ProbeFailed {
            message: format!(
                "Missing dependency: {}",
                parsed.missing.unwrap_or_else(|| "unknown module".to_string())
            ),
            hint: Some(INSTALL_HINT.to_string()),
        });
    }

    Ok(ProbeReport {
        python_binary: python,
        torch_version: parsed.torch.unwrap_or_else(|| "unknown".to_string()),
        ultralytics_version: parsed.ultralytics.unwrap_or_else(|| "unknown".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_line_success_parse() {
        let line: ProbeLine =
            serde_json::from_str(r#"{"ok": true, "torch": "2.3.1", "ultralytics": "8.2.0"}"#)
                .unwrap();
        assert!(line.ok);
        assert_eq!(line.torch.as_deref(), Some("2.3.1"));
        assert_eq!(line.ultralytics.as_deref(), Some("8.2.0"));
    }

    #[test]
    fn test_probe_line_missing_parse() {
        let line: ProbeLine =
            serde_json::from_str(r#"{"ok": false, "missing": "No module named 'ultralytics'"}"#)
                .unwrap();
        assert!(!line.ok);
        assert!(line.missing.unwrap().contains("ultralytics"));
    }

    #[test]
    fn test_snippet_prints_single_json_line() {
        // The snippet must stay a one-liner protocol: the probe parses the
        // last non-empty stdout line as JSON.
        assert!(PROBE_SNIPPET.contains("json.dumps"));
        assert_eq!(PROBE_SNIPPET.matches("print(").count(), 2);
    }
}
