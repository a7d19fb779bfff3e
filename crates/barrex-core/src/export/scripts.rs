//! Embedded Python export script and deployment utilities.
//!
//! The script is stored as a string constant and written to a cache directory
//! on first use or when the embedded version changes (detected via hash
//! comparison), so the toolkit ships as a single binary.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{BarrexError, Result};

/// Python script invoking the ultralytics ONNX exporter.
///
/// Reports progress as JSON lines on stdout; exits non-zero on failure after
/// emitting an `error` stage line.
pub const EXPORT_SCRIPT: &str = r#"#!/usr/bin/env python3
"""Export a YOLOv8 checkpoint to ONNX.

Thin wrapper over ultralytics' built-in exporter. Reports progress as JSON
lines on stdout so the orchestrating process can stream status.
"""
import argparse
import json
import os
import sys

def progress(stage, **kwargs):
    """Emit a JSON progress line to stdout."""
    print(json.dumps({"stage": stage, **kwargs}), flush=True)

def main():
    parser = argparse.ArgumentParser(description="Export YOLOv8 to ONNX")
    parser.add_argument("--model", required=True, help="Path to the .pt checkpoint")
    parser.add_argument("--img-size", type=int, default=640, help="Input image size")
    parser.add_argument("--batch", type=int, default=1, help="Batch size")
    parser.add_argument("--opset", type=int, required=True, help="ONNX opset version")
    parser.add_argument("--dynamic", action="store_true", help="Dynamic input shapes")
    parser.add_argument("--simplify", action="store_true", help="Simplify the exported graph")
    parser.add_argument("--half", action="store_true", help="Half-precision weights")
    args = parser.parse_args()

    try:
        from ultralytics import YOLO
    except ImportError as e:
        progress("error", message=f"Missing required package: {e}")
        sys.exit(1)

    try:
        progress("loading", message=f"Loading checkpoint {args.model}")
        model = YOLO(args.model)

        progress("exporting", message=f"Exporting with opset {args.opset}")
        exported = model.export(
            format="onnx",
            imgsz=args.img_size,
            batch=args.batch,
            opset=args.opset,
            dynamic=args.dynamic,
            simplify=args.simplify,
            half=args.half,
        )
    except Exception as e:
        progress("error", message=str(e))
        sys.exit(1)

    # export() returns the artifact path as a string; fall back to the
    # conventional location next to the checkpoint.
    onnx_path = str(exported) if exported else os.path.splitext(args.model)[0] + ".onnx"
    if not os.path.exists(onnx_path):
        progress("error", message=f"Exporter reported success but {onnx_path} does not exist")
        sys.exit(1)

    progress("complete", output_path=onnx_path, output_size=os.path.getsize(onnx_path))

if __name__ == "__main__":
    main()
"#;

pub const EXPORT_SCRIPT_NAME: &str = "export_yolo.py";

/// Compute a short hash of a string for staleness checking.
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..8])
}

/// Directory the export script is deployed to.
///
/// Uses the platform cache directory, falling back to a dot-directory in the
/// working directory when none is available.
pub fn scripts_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".barrex-cache"))
        .join("barrex")
        .join("scripts")
}

/// Deploy the embedded script to `dir` if missing or outdated.
///
/// Uses a `.hash` sidecar file to detect when the embedded script has changed
/// and needs to be rewritten. Returns the script path.
pub fn ensure_script_deployed(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| BarrexError::io("creating scripts dir", dir, e))?;

    let script_path = dir.join(EXPORT_SCRIPT_NAME);
    let hash_path = dir.join(format!("{EXPORT_SCRIPT_NAME}.hash"));
    let current_hash = content_hash(EXPORT_SCRIPT);

    if script_path.exists() {
        if let Ok(stored_hash) = std::fs::read_to_string(&hash_path) {
            if stored_hash.trim() == current_hash {
                return Ok(script_path);
            }
        }
    }

    std::fs::write(&script_path, EXPORT_SCRIPT)
        .map_err(|e| BarrexError::io("writing export script", &script_path, e))?;
    std::fs::write(&hash_path, &current_hash)
        .map_err(|e| BarrexError::io("writing script hash", &hash_path, e))?;
    info!("Export script deployed to {}", script_path.display());
    Ok(script_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deploy_writes_script_and_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = ensure_script_deployed(temp.path()).unwrap();

        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("ultralytics"));
        assert!(temp
            .path()
            .join(format!("{EXPORT_SCRIPT_NAME}.hash"))
            .exists());
    }

    #[test]
    fn test_deploy_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = ensure_script_deployed(temp.path()).unwrap();
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();

        ensure_script_deployed(temp.path()).unwrap();
        assert_eq!(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
            mtime
        );
    }

    #[test]
    fn test_deploy_rewrites_stale_script() {
        let temp = TempDir::new().unwrap();
        let path = ensure_script_deployed(temp.path()).unwrap();
        std::fs::write(&path, "# tampered").unwrap();
        std::fs::write(temp.path().join(format!("{EXPORT_SCRIPT_NAME}.hash")), "0000").unwrap();

        ensure_script_deployed(temp.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("ultralytics"));
    }
}
