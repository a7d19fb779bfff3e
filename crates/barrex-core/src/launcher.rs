//! Developer launcher: project orientation text and documentation opening.
//!
//! No business logic lives here. The browser-open step sits behind the
//! `DocOpener` trait so tests never spawn a real browser.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;
use url::Url;

use crate::{BarrexError, Result};

/// Documentation files the launcher points at, relative to the project root.
pub const SETUP_CHECKLIST: &str = "UNITY_SETUP_CHECKLIST.md";
pub const KEY_FILES: &[(&str, &str)] = &[
    ("Setup Guide", SETUP_CHECKLIST),
    ("Documentation", "README.md"),
    ("ONNX Model", "yolov8n.onnx"),
];

/// Capability to open a documentation URL in the user's browser.
pub trait DocOpener {
    fn open(&self, url: &Url) -> Result<()>;
}

/// Opens URLs via the platform's default handler.
///
/// Linux: `xdg-open`; macOS: `open`; Windows: `cmd /C start`. The child is
/// detached; a failed spawn is the only error surfaced.
pub struct SystemDocOpener;

impl DocOpener for SystemDocOpener {
    fn open(&self, url: &Url) -> Result<()> {
        #[cfg(target_os = "linux")]
        let mut command = {
            let mut c = Command::new("xdg-open");
            c.arg(url.as_str());
            c
        };

        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = Command::new("open");
            c.arg(url.as_str());
            c
        };

        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url.as_str()]);
            c
        };

        debug!("Opening documentation URL: {}", url);
        command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BarrexError::Other(format!("Failed to open browser: {e}")))?;
        Ok(())
    }
}

/// `file://` URL for the setup checklist under `base_dir`.
pub fn setup_checklist_url(base_dir: &Path) -> Result<Url> {
    let path = absolute(base_dir.join(SETUP_CHECKLIST))?;
    Url::from_file_path(&path).map_err(|_| BarrexError::Config {
        message: format!("Cannot build file URL for {}", path.display()),
    })
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// The fixed orientation text printed by the launcher.
pub fn project_overview(base_dir: &Path) -> String {
    let mut text = String::new();
    text.push_str("Project location:\n");
    text.push_str(&format!("   {}\n\n", base_dir.display()));

    text.push_str("Key files:\n");
    for (label, file) in KEY_FILES {
        text.push_str(&format!("   {label}: {}\n", base_dir.join(file).display()));
    }

    text.push_str("\nNext steps:\n");
    text.push_str("1. Open Unity Hub and create a new 3D project\n");
    text.push_str("2. Install packages: Barracuda, TextMeshPro\n");
    text.push_str("3. Import the detection scripts to Assets/Scripts/\n");
    text.push_str("4. Import the exported ONNX model to Assets/Models/\n");
    text.push_str("5. Run Tools > Object Detection > Setup Wizard\n");
    text.push_str("6. Press Play and start detecting\n");
    text
}

/// Interpret a yes/no prompt response.
pub fn is_affirmative(response: &str) -> bool {
    matches!(response.trim().to_lowercase().as_str(), "y" | "yes")
}
