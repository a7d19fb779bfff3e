//! barrex-core - Headless library for YOLO-to-Barracuda ONNX export.
//!
//! This crate provides the pipeline behind the barrex command-line tools:
//! probe the Python export toolchain, drive the ultralytics exporter in a
//! subprocess, relocate the produced ONNX artifact, and structurally verify
//! it. Binaries live in the `barrex-cli` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use barrex_core::{CompatProfile, ExportRequest, Exporter, UltralyticsExporter};
//!
//! #[tokio::main]
//! async fn main() -> barrex_core::Result<()> {
//!     barrex_core::probe::probe_toolchain().await?;
//!
//!     let request = ExportRequest::new("yolov8n.pt", CompatProfile::ModernRuntime);
//!     let artifact = UltralyticsExporter::new().export(&request).await?;
//!
//!     match barrex_core::verify::verify_artifact(&artifact) {
//!         Ok(report) => println!("{report}"),
//!         Err(e) => eprintln!("Warning: {e}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod launcher;
pub mod probe;
pub mod verify;

// Re-export commonly used types
pub use config::CompatProfile;
pub use error::{BarrexError, Result};
pub use export::{ExportRequest, Exporter, UltralyticsExporter};
pub use launcher::{DocOpener, SystemDocOpener};
pub use probe::ProbeReport;
pub use verify::VerificationReport;
