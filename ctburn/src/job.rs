//! Burn job descriptor: loading, path resolution and validation
//!
//! ```json
//! {
//!   "ip_address": "10.0.0.7",
//!   "starting_index": 5,
//!   "chip_type_list": ["ABC123", "xyz-99"],
//!   "burn_exe_path": "C:\\Program Files (x86)\\Cisco Systems\\BurnSccSetup\\BurnScc.exe",
//!   "ct_search_root": "D:\\SQUAD\\_SQUAD_Output_File_"
//! }
//! ```
//!
//! `chip_list_file` may replace `chip_type_list`. Relative paths are taken
//! relative to the descriptor's directory.

use crate::chip_list::{from_explicit_list, load_chip_list_file};
use crate::errors::ConfigError;
use crate::sequencer::SequencerConfig;
use crate::token::ChipTypeToken;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

pub const DEFAULT_BURN_EXE_PATH: &str =
    r"C:\Program Files (x86)\Cisco Systems\BurnSccSetup\BurnScc.exe";
pub const DEFAULT_CT_SEARCH_ROOT: &str = r"D:\SQUAD\_SQUAD_Output_File_";

/// Where the chip list came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChipSource {
    Inline,
    File(PathBuf),
}

/// One batch: which chip types to burn, in which order, with what.
#[derive(Debug, Clone)]
pub struct BurnJob {
    ip_address: String,
    starting_index: u64,
    chip_source: ChipSource,
    chip_types: Vec<ChipTypeToken>,
    burn_exe_path: PathBuf,
    ct_search_root: PathBuf,
}

impl BurnJob {
    /// Build a job from already-resolved parts.
    ///
    /// Checks the address and chip list; filesystem checks are left to
    /// [`BurnJob::validate_paths`].
    pub fn new(
        ip_address: impl Into<String>,
        starting_index: u64,
        chip_source: ChipSource,
        chip_types: Vec<ChipTypeToken>,
        burn_exe_path: impl Into<PathBuf>,
        ct_search_root: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let ip_address = ip_address.into().trim().to_string();
        if ip_address.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ip_address".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if chip_types.is_empty() {
            return Err(ConfigError::EmptySource("chip type list".to_string()));
        }
        Ok(Self {
            ip_address,
            starting_index,
            chip_source,
            chip_types,
            burn_exe_path: burn_exe_path.into(),
            ct_search_root: ct_search_root.into(),
        })
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn starting_index(&self) -> u64 {
        self.starting_index
    }

    pub fn chip_source(&self) -> &ChipSource {
        &self.chip_source
    }

    pub fn chip_types(&self) -> &[ChipTypeToken] {
        &self.chip_types
    }

    pub fn burn_exe_path(&self) -> &Path {
        &self.burn_exe_path
    }

    pub fn ct_search_root(&self) -> &Path {
        &self.ct_search_root
    }

    pub fn validate_paths(&self) -> Result<(), ConfigError> {
        if !self.burn_exe_path.is_file() {
            return Err(ConfigError::PathNotFound {
                kind: "burn_exe_path",
                path: self.burn_exe_path.clone(),
            });
        }
        if !self.ct_search_root.is_dir() {
            return Err(ConfigError::PathNotFound {
                kind: "ct_search_root",
                path: self.ct_search_root.clone(),
            });
        }
        Ok(())
    }
}

/// A validated job plus the automation settings that came with it
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub job: BurnJob,
    pub settings: SequencerConfig,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    ip_address: Option<Value>,
    starting_index: Option<Value>,
    chip_type_list: Option<Value>,
    chip_list_file: Option<Value>,
    burn_exe_path: Option<Value>,
    ct_search_root: Option<Value>,
    #[serde(default)]
    automation: Option<SequencerConfig>,
}

/// Load and validate a JSON job descriptor.
#[instrument(level = "debug")]
pub fn load_job(config_path: &Path) -> Result<LoadedJob, ConfigError> {
    let text = fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;
    let base_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parse_job(&text, base_dir)
}

/// Parse and validate descriptor text; relative paths resolve against
/// `base_dir`, which is itself made absolute against the working directory.
pub fn parse_job(text: &str, base_dir: &Path) -> Result<LoadedJob, ConfigError> {
    let base_dir = absolute_dir(base_dir)?;
    let base_dir = base_dir.as_path();
    let root: Value = serde_json::from_str(text)?;
    if !root.is_object() {
        return Err(ConfigError::InvalidValue {
            key: "<root>".to_string(),
            reason: "JSON config root must be an object".to_string(),
        });
    }
    let raw: RawDescriptor = serde_json::from_value(root)?;

    let ip_address = require_text("ip_address", raw.ip_address.as_ref())?;
    let starting_index = parse_starting_index(raw.starting_index.as_ref())?;

    let burn_exe_path = resolve_path(
        &optional_text(raw.burn_exe_path.as_ref())
            .unwrap_or_else(|| DEFAULT_BURN_EXE_PATH.to_string()),
        base_dir,
    );
    let ct_search_root = resolve_path(
        &optional_text(raw.ct_search_root.as_ref())
            .unwrap_or_else(|| DEFAULT_CT_SEARCH_ROOT.to_string()),
        base_dir,
    );

    let (chip_source, chip_types) = match raw.chip_type_list.filter(|v| !v.is_null()) {
        Some(Value::Array(items)) => {
            let texts: Vec<String> = items.iter().map(value_text).collect();
            (ChipSource::Inline, from_explicit_list(texts)?)
        }
        Some(_) => {
            return Err(ConfigError::InvalidValue {
                key: "chip_type_list".to_string(),
                reason: "must be an array of chip type strings".to_string(),
            })
        }
        None => {
            let list_file =
                resolve_path(&require_text("chip_list_file", raw.chip_list_file.as_ref())?, base_dir);
            if !list_file.is_file() {
                return Err(ConfigError::PathNotFound {
                    kind: "chip_list_file",
                    path: list_file,
                });
            }
            let tokens = load_chip_list_file(&list_file)?;
            (ChipSource::File(list_file), tokens)
        }
    };

    let job = BurnJob::new(
        ip_address,
        starting_index,
        chip_source,
        chip_types,
        burn_exe_path,
        ct_search_root,
    )?;
    job.validate_paths()?;
    debug!(
        "loaded job with {} chip types starting at index {}",
        job.chip_types().len(),
        job.starting_index()
    );

    Ok(LoadedJob {
        job,
        settings: raw.automation.unwrap_or_default(),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .filter(|v| !v.is_null())
        .map(value_text)
        .filter(|t| !t.is_empty())
}

fn require_text(key: &str, value: Option<&Value>) -> Result<String, ConfigError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    let text = value_text(value);
    if text.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(text)
}

fn parse_starting_index(value: Option<&Value>) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: "starting_index".to_string(),
        reason: reason.to_string(),
    };
    let number = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| invalid("must be an integer"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid("must be an integer"))?,
        Some(Value::Null) | None => return Err(ConfigError::MissingKey("starting_index".into())),
        Some(_) => return Err(invalid("must be an integer")),
    };
    u64::try_from(number).map_err(|_| invalid("must be >= 0"))
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    std::path::absolute(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn resolve_path(text: &str, base_dir: &Path) -> PathBuf {
    let raw = PathBuf::from(text.trim());
    if raw.is_absolute() {
        raw
    } else {
        base_dir.join(raw)
    }
}
