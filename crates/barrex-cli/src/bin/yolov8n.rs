//! barrex-yolov8n - Zero-argument preset converter.
//!
//! Converts `yolov8n.pt` in the working directory to `yolov8n_barracuda.onnx`
//! under the legacy-runtime profile (opset 9, no simplification, full
//! precision), the settings older Barracuda releases require.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use barrex_core::export::{ExportRequest, Exporter, UltralyticsExporter};
use barrex_core::{probe, verify, CompatProfile};

const INPUT_CHECKPOINT: &str = "yolov8n.pt";
const OUTPUT_ARTIFACT: &str = "yolov8n_barracuda.onnx";

#[tokio::main]
async fn main() -> ExitCode {
    barrex_cli::init_logging(false);

    println!("YOLOv8 to Barracuda-compatible ONNX converter");
    println!("{}", "=".repeat(50));

    if convert_default_checkpoint().await {
        println!();
        println!("Conversion completed successfully!");
        println!();
        println!("Next steps:");
        println!("1. Copy {OUTPUT_ARTIFACT} to Unity's StreamingAssets folder");
        println!("2. Update ObjectDetectionManager fallbackModelPath to '{OUTPUT_ARTIFACT}'");
        println!("3. Test in Unity - should load without format errors");
        ExitCode::SUCCESS
    } else {
        println!();
        println!("Conversion failed. Check error messages above.");
        ExitCode::from(1)
    }
}

/// Run the fixed conversion; true on success.
async fn convert_default_checkpoint() -> bool {
    let checkpoint = Path::new(INPUT_CHECKPOINT);
    if !checkpoint.is_file() {
        eprintln!("Model file not found: {INPUT_CHECKPOINT}");
        eprintln!("Ensure {INPUT_CHECKPOINT} is in the current directory");
        return false;
    }

    match probe::probe_toolchain().await {
        Ok(report) => {
            println!(
                "Toolchain ready (torch {}, ultralytics {})",
                report.torch_version, report.ultralytics_version
            );
        }
        Err(e) => {
            eprintln!("{e}");
            return false;
        }
    }

    let mut request = ExportRequest::new(checkpoint, CompatProfile::LegacyRuntime);
    request.output = Some(PathBuf::from(OUTPUT_ARTIFACT));

    println!(
        "Converting to ONNX (opset {}, simplify off, full precision)...",
        request.profile.opset()
    );

    let artifact = match UltralyticsExporter::new().export(&request).await {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{e}");
            return false;
        }
    };

    println!("Model successfully converted to: {}", artifact.display());

    match verify::verify_artifact(&artifact) {
        Ok(report) => {
            println!("ONNX model validation passed");
            println!("Model info:");
            print!("{report}");
        }
        Err(e) => eprintln!("Warning: {e}"),
    }

    true
}
