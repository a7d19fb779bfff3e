//! Export stage: checkpoint in, ONNX artifact out.
//!
//! The conversion itself is performed by the ultralytics exporter running in
//! a Python subprocess; this module owns the embedded script, the subprocess
//! lifecycle, the JSON-line progress protocol, and artifact relocation.

mod exporter;
pub(crate) mod scripts;
mod types;

pub use exporter::{finalize_artifact, Exporter, UltralyticsExporter};
pub use types::{ExportRequest, ScriptEventLine};
