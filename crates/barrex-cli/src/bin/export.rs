//! barrex-export - Convert a YOLOv8 checkpoint to Barracuda-compatible ONNX.
//!
//! Exit codes: 1 when the input file is missing, the toolchain probe fails,
//! or the export fails; 0 otherwise. Verification problems are warnings and
//! never change the exit code.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use barrex_core::export::{ExportRequest, Exporter, UltralyticsExporter};
use barrex_core::{probe, verify, CompatProfile};

#[derive(Parser, Debug)]
#[command(name = "barrex-export")]
#[command(about = "Convert a YOLOv8 model to ONNX format for Unity Barracuda")]
struct Args {
    /// Path to the YOLOv8 .pt checkpoint
    model_path: PathBuf,

    /// Output path for the ONNX file (default: <stem>.onnx in the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input image size
    #[arg(long, default_value_t = 640)]
    img_size: u32,

    /// Batch size
    #[arg(long, default_value_t = 1)]
    batch_size: u32,

    /// Enable dynamic input shapes
    #[arg(long)]
    dynamic: bool,

    /// Disable ONNX graph simplification
    #[arg(long)]
    no_simplify: bool,

    /// Export half-precision weights (modern-runtime profile only)
    #[arg(long)]
    half: bool,

    /// Barracuda compatibility profile: legacy-runtime (opset 9) or
    /// modern-runtime (opset 11)
    #[arg(long, default_value = "modern-runtime")]
    profile: CompatProfile,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    barrex_cli::init_logging(args.debug);

    if !args.model_path.is_file() {
        eprintln!("Model file not found: {}", args.model_path.display());
        return ExitCode::from(1);
    }

    // Probe before touching the filesystem; a broken toolchain aborts the run.
    let report = match probe::probe_toolchain().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{e}");
            if let barrex_core::BarrexError::ProbeFailed {
                hint: Some(hint), ..
            } = e
            {
                eprintln!("Hint: {hint}");
            }
            return ExitCode::from(1);
        }
    };
    println!("Python: {}", report.python_binary);
    println!("PyTorch version: {}", report.torch_version);
    println!("Ultralytics version: {}", report.ultralytics_version);

    let mut request = ExportRequest::new(&args.model_path, args.profile);
    request.output = args.output.clone();
    request.img_size = args.img_size;
    request.batch_size = args.batch_size;
    request.dynamic = args.dynamic;
    request.no_simplify = args.no_simplify;
    request.half = args.half;

    let output = request.resolved_output();
    println!();
    println!(
        "Converting {} to {}",
        args.model_path.display(),
        output.display()
    );
    println!("  Profile: {}", request.profile);
    println!("  Image size: {}", request.img_size);
    println!("  Batch size: {}", request.batch_size);
    println!("  Dynamic shapes: {}", request.dynamic);
    println!("  Simplify: {}", request.effective_simplify());
    println!("  ONNX opset: {}", request.profile.opset());

    let exporter = UltralyticsExporter::new();
    let artifact = match exporter.export(&request).await {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Conversion failed.");
            return ExitCode::from(1);
        }
    };

    println!("Conversion successful!");
    println!("ONNX model saved to: {}", artifact.display());

    // Advisory only: a verification problem never overturns the export.
    match verify::verify_artifact(&artifact) {
        Ok(report) => {
            println!("Model verification passed");
            print!("{report}");
        }
        Err(e) => eprintln!("Warning: {e}"),
    }

    println!();
    println!(
        "Import {} into Unity and assign it to ObjectDetectionManager.modelAsset",
        artifact.display()
    );
    ExitCode::SUCCESS
}
