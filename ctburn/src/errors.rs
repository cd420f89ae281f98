use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Failed to set '{label}' to '{expected}' (last read back: '{actual}') after {attempts} attempts")]
    VerificationFailed {
        label: String,
        expected: String,
        actual: String,
        attempts: u32,
    },

    #[error("Window matching '{pattern}' did not become visible within {timeout_ms}ms")]
    LaunchTimeout { pattern: String, timeout_ms: u64 },

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("{0}")]
    NotFound(String),

    #[error(
        "Ambiguous CT file match for chip type '{chip_type}'. {total} candidates found:\n{}\nRename files for an exact match (stem == chip type) or make the chip type more specific.",
        display_paths(.candidates)
    )]
    Ambiguous {
        chip_type: String,
        candidates: Vec<PathBuf>,
        total: usize,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required key in JSON config: {0}")]
    MissingKey(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("{kind} not found: {path}")]
    PathNotFound { kind: &'static str, path: PathBuf },

    #[error("No chip types found in {0}")]
    EmptySource(String),
}

/// Any failure that ends a burn run.
#[derive(Error, Debug)]
pub enum BurnError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Automation(#[from] AutomationError),
}
