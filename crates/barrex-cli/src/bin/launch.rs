//! barrex-launch - Project orientation for the object detection system.
//!
//! Prints where the key files live and the Unity-side setup steps, then
//! offers to open the setup checklist in the default browser. Always exits 0;
//! a refused prompt, an interrupt, or a failed browser spawn only prints a
//! note.

use std::io::{BufRead, Write};

use barrex_core::launcher::{self, DocOpener, SystemDocOpener};

fn main() {
    barrex_cli::init_logging(false);

    // Ctrl-C at the prompt is a normal way out, not a crash.
    if let Err(e) = ctrlc::set_handler(|| {
        println!();
        println!("Happy detecting!");
        std::process::exit(0);
    }) {
        tracing::warn!("Could not install interrupt handler: {e}");
    }

    println!("Unity Object Detection System - Quick Launcher");
    println!("{}", "=".repeat(50));
    println!();

    let base_dir = std::env::current_dir().unwrap_or_else(|_| ".".into());
    println!("{}", launcher::project_overview(&base_dir));

    run_prompt(
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
        &SystemDocOpener,
        &base_dir,
    );

    println!();
    println!("Happy detecting!");
}

/// Ask whether to open the checklist and act on the answer.
///
/// Every failure path (closed stdin, missing checklist, browser spawn error)
/// is reported as a console note and otherwise ignored.
fn run_prompt(
    input: &mut impl BufRead,
    output: &mut impl Write,
    opener: &impl DocOpener,
    base_dir: &std::path::Path,
) {
    let _ = write!(output, "Open setup checklist in browser? (y/n): ");
    let _ = output.flush();

    let mut response = String::new();
    if input.read_line(&mut response).is_err() {
        return;
    }
    if !launcher::is_affirmative(&response) {
        return;
    }

    if !base_dir.join(launcher::SETUP_CHECKLIST).exists() {
        let _ = writeln!(output, "Checklist file not found");
        return;
    }

    match launcher::setup_checklist_url(base_dir).and_then(|url| opener.open(&url)) {
        Ok(()) => {
            let _ = writeln!(output, "Opening setup checklist in browser...");
        }
        Err(e) => {
            let _ = writeln!(output, "Could not open checklist: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrex_core::Result;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use url::Url;

    struct RecordingOpener {
        opened: Mutex<Vec<Url>>,
    }

    impl DocOpener for RecordingOpener {
        fn open(&self, url: &Url) -> Result<()> {
            self.opened.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    #[test]
    fn test_declined_prompt_opens_nothing() {
        let opener = RecordingOpener {
            opened: Mutex::new(Vec::new()),
        };
        let mut out = Vec::new();
        run_prompt(&mut "n\n".as_bytes(), &mut out, &opener, std::path::Path::new("/tmp"));
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_accepted_prompt_opens_checklist() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(launcher::SETUP_CHECKLIST), "# checklist").unwrap();

        let opener = RecordingOpener {
            opened: Mutex::new(Vec::new()),
        };
        let mut out = Vec::new();
        run_prompt(&mut "yes\n".as_bytes(), &mut out, &opener, temp.path());

        let opened = opener.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].scheme(), "file");
    }

    #[test]
    fn test_missing_checklist_is_reported_not_fatal() {
        let temp = TempDir::new().unwrap();
        let opener = RecordingOpener {
            opened: Mutex::new(Vec::new()),
        };
        let mut out = Vec::new();
        run_prompt(&mut "y\n".as_bytes(), &mut out, &opener, temp.path());

        assert!(opener.opened.lock().unwrap().is_empty());
        assert!(String::from_utf8(out).unwrap().contains("not found"));
    }

    #[test]
    fn test_closed_stdin_is_silent() {
        struct FailingRead;
        impl std::io::Read for FailingRead {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
            }
        }

        let opener = RecordingOpener {
            opened: Mutex::new(Vec::new()),
        };
        let mut out = Vec::new();
        run_prompt(
            &mut std::io::BufReader::new(FailingRead),
            &mut out,
            &opener,
            std::path::Path::new("/tmp"),
        );
        assert!(opener.opened.lock().unwrap().is_empty());
    }
}
