//! Types for the export stage.

use serde::Deserialize;
use std::path::PathBuf;

use crate::config::{AppConfig, CompatProfile};

/// A single export invocation: one checkpoint in, one artifact out.
///
/// Immutable once constructed; built per invocation and discarded with the
/// process.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Path to the YOLOv8 `.pt` checkpoint. Must reference an existing file.
    pub model_path: PathBuf,
    /// Output artifact path. Derived from the checkpoint stem when absent.
    pub output: Option<PathBuf>,
    /// Input image size (square).
    pub img_size: u32,
    /// Batch size.
    pub batch_size: u32,
    /// Enable dynamic input shapes.
    pub dynamic: bool,
    /// Disable graph simplification even where the profile enables it.
    pub no_simplify: bool,
    /// Request half-precision weights. Ignored by profiles that require full
    /// precision.
    pub half: bool,
    /// Barracuda compatibility profile.
    pub profile: CompatProfile,
}

impl ExportRequest {
    /// A request with profile defaults for everything but the checkpoint path.
    pub fn new(model_path: impl Into<PathBuf>, profile: CompatProfile) -> Self {
        Self {
            model_path: model_path.into(),
            output: None,
            img_size: AppConfig::DEFAULT_IMG_SIZE,
            batch_size: AppConfig::DEFAULT_BATCH_SIZE,
            dynamic: false,
            no_simplify: false,
            half: false,
            profile,
        }
    }

    /// Resolve the output path: explicit `--output` wins, otherwise the
    /// checkpoint's stem with the artifact extension, in the working
    /// directory.
    pub fn resolved_output(&self) -> PathBuf {
        if let Some(ref out) = self.output {
            return out.clone();
        }
        let stem = self
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());
        PathBuf::from(format!("{stem}.{}", AppConfig::ARTIFACT_EXTENSION))
    }

    /// Whether the exporter should simplify the graph, combining the profile
    /// default with an explicit `--no-simplify`.
    pub fn effective_simplify(&self) -> bool {
        self.profile.simplify_default() && !self.no_simplify
    }

    /// Whether the exporter should emit half-precision weights. Legacy
    /// Barracuda needs full precision, so its profile overrides the request.
    pub fn effective_half(&self) -> bool {
        self.half && self.profile.allow_half()
    }

    /// Where the ultralytics exporter drops its artifact before relocation:
    /// next to the checkpoint, same stem, `.onnx` extension.
    pub fn default_artifact_path(&self) -> PathBuf {
        self.model_path.with_extension(AppConfig::ARTIFACT_EXTENSION)
    }
}

/// JSON progress line emitted by the embedded Python export script on stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEventLine {
    pub stage: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_size: Option<u64>,
}

impl ScriptEventLine {
    pub fn is_complete(&self) -> bool {
        self.stage == "complete"
    }

    pub fn is_error(&self) -> bool {
        self.stage == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolved_output_defaults_to_stem_in_cwd() {
        let request = ExportRequest::new("weights/yolov8n.pt", CompatProfile::ModernRuntime);
        assert_eq!(request.resolved_output(), PathBuf::from("yolov8n.onnx"));
    }

    #[test]
    fn test_resolved_output_honors_explicit_path() {
        let mut request = ExportRequest::new("yolov8n.pt", CompatProfile::ModernRuntime);
        request.output = Some(PathBuf::from("models/out.onnx"));
        assert_eq!(request.resolved_output(), PathBuf::from("models/out.onnx"));
    }

    #[test]
    fn test_effective_simplify_combines_profile_and_flag() {
        let mut request = ExportRequest::new("m.pt", CompatProfile::ModernRuntime);
        assert!(request.effective_simplify());
        request.no_simplify = true;
        assert!(!request.effective_simplify());

        // The legacy profile never simplifies, flag or not.
        let request = ExportRequest::new("m.pt", CompatProfile::LegacyRuntime);
        assert!(!request.effective_simplify());
    }

    #[test]
    fn test_effective_half_gated_by_profile() {
        let mut request = ExportRequest::new("m.pt", CompatProfile::LegacyRuntime);
        request.half = true;
        assert!(!request.effective_half());

        let mut request = ExportRequest::new("m.pt", CompatProfile::ModernRuntime);
        assert!(!request.effective_half());
        request.half = true;
        assert!(request.effective_half());
    }

    #[test]
    fn test_default_artifact_path_sits_next_to_checkpoint() {
        let request = ExportRequest::new("weights/yolov8n.pt", CompatProfile::LegacyRuntime);
        assert_eq!(
            request.default_artifact_path(),
            Path::new("weights/yolov8n.onnx")
        );
    }

    #[test]
    fn test_script_event_line_parse() {
        let line: ScriptEventLine = serde_json::from_str(
            r#"{"stage": "complete", "output_path": "/tmp/yolov8n.onnx", "output_size": 12884480}"#,
        )
        .unwrap();
        assert!(line.is_complete());
        assert_eq!(line.output_size, Some(12_884_480));
    }
}
