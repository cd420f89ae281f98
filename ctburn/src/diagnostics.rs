//! Persisted failure traces
//!
//! The location is fixed once at start-up and handed to whoever needs it,
//! so the operator always knows where to look after a failed run.

use chrono::Local;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ERROR_LOG_FILE_NAME: &str = "ctburn_error.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<Desktop>/ctburn_error.log`, falling back to the home directory and
    /// then the working directory.
    pub fn resolve_default() -> Self {
        let dir = dirs::desktop_dir()
            .filter(|d| d.is_dir())
            .or_else(|| dirs::home_dir().filter(|d| d.is_dir()))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(ERROR_LOG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a trace. Failures are logged and otherwise ignored.
    pub fn append(&self, trace: &str) -> bool {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                writeln!(
                    file,
                    "\n--- ERROR {} ---",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                )?;
                file.write_all(trace.as_bytes())?;
                if !trace.ends_with('\n') {
                    file.write_all(b"\n")?;
                }
                Ok(())
            });

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "could not write diagnostic trace to {}: {e}",
                    self.path.display()
                );
                false
            }
        }
    }
}

/// Human-readable trace: a context line, the error, then its source chain.
pub fn format_trace(context: &str, error: &(dyn Error + 'static)) -> String {
    let mut trace = format!("{context}\nError: {error}\n");
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str(&format!("Caused by: {cause}\n"));
        source = cause.source();
    }
    trace
}
