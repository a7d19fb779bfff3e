//! Centralized configuration for the barrex toolkit.
//!
//! Holds the two Barracuda compatibility profiles, subprocess timeouts, and
//! Python interpreter selection. The two profiles exist because the target
//! runtime's opset support differs between Barracuda releases; the choice is
//! explicit rather than baked into duplicated tools.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "barrex";
    /// Extension of the interchange artifact produced by the export stage.
    pub const ARTIFACT_EXTENSION: &'static str = "onnx";
    /// Default input image size expected by YOLOv8 checkpoints.
    pub const DEFAULT_IMG_SIZE: u32 = 640;
    /// Default batch size; Barracuda consumes single-image batches.
    pub const DEFAULT_BATCH_SIZE: u32 = 1;
}

/// Subprocess timeouts for the probe and export stages.
pub struct SubprocessConfig;

impl SubprocessConfig {
    /// The probe only imports two modules and prints versions.
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);
    /// Exporting traces the full model graph; allow for cold torch startup.
    pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(600);
}

/// Python interpreter selection.
pub struct PythonConfig;

impl PythonConfig {
    pub const DEFAULT_BINARY: &'static str = "python3";
    pub const ENV_OVERRIDE: &'static str = "BARREX_PYTHON";

    /// Resolve the interpreter to use, honoring the `BARREX_PYTHON` override.
    pub fn binary() -> String {
        std::env::var(Self::ENV_OVERRIDE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_BINARY.to_string())
    }
}

/// Named Barracuda compatibility profile.
///
/// The two presets found in the field disagree: older Barracuda releases only
/// load opset <= 9 models and choke on simplified graphs, while newer ones
/// accept opset 11. Which one applies is owned by whoever owns the Unity
/// project, so the profile is a first-class, named option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatProfile {
    /// Opset 9, simplification off, full precision, static shapes.
    LegacyRuntime,
    /// Opset 11, simplification on.
    ModernRuntime,
}

impl CompatProfile {
    /// Declared ONNX opset version for this profile.
    pub fn opset(self) -> u32 {
        match self {
            CompatProfile::LegacyRuntime => 9,
            CompatProfile::ModernRuntime => 11,
        }
    }

    /// Whether graph simplification is enabled by default.
    ///
    /// Legacy Barracuda depends on the unsimplified tensor structure, so the
    /// legacy profile ignores any request to simplify.
    pub fn simplify_default(self) -> bool {
        matches!(self, CompatProfile::ModernRuntime)
    }

    /// Whether half-precision weights are permitted.
    pub fn allow_half(self) -> bool {
        matches!(self, CompatProfile::ModernRuntime)
    }

    pub fn name(self) -> &'static str {
        match self {
            CompatProfile::LegacyRuntime => "legacy-runtime",
            CompatProfile::ModernRuntime => "modern-runtime",
        }
    }
}

impl std::fmt::Display for CompatProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CompatProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "legacy-runtime" | "legacy" => Ok(CompatProfile::LegacyRuntime),
            "modern-runtime" | "modern" => Ok(CompatProfile::ModernRuntime),
            other => Err(format!(
                "unknown profile '{other}' (expected legacy-runtime or modern-runtime)"
            )),
        }
    }
}
