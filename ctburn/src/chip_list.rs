//! Reading the ordered list of chip types a job should burn

use crate::errors::ConfigError;
use crate::token::{trim_token, ChipTypeToken};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// `Chip_Type = <value>`, key matched case-insensitively anywhere in the line
const CHIP_TYPE_PATTERN: &str = r"(?i)Chip_Type\s*=\s*(.+?)\s*$";

/// Extract chip types from `Chip_Type = value` lines, in file order.
pub fn parse_chip_types(text: &str) -> Result<Vec<ChipTypeToken>, ConfigError> {
    let pattern = Regex::new(CHIP_TYPE_PATTERN).map_err(|e| ConfigError::InvalidValue {
        key: "chip type pattern".to_string(),
        reason: e.to_string(),
    })?;

    let tokens: Vec<ChipTypeToken> = text
        .lines()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|value| trim_token(value.as_str()))
        .filter(|value| !value.is_empty())
        .map(ChipTypeToken::new)
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::EmptySource(
            "text source (no lines with 'Chip_Type =')".to_string(),
        ));
    }
    Ok(tokens)
}

/// Read and parse a chip list file.
pub fn load_chip_list_file(path: &Path) -> Result<Vec<ChipTypeToken>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = parse_chip_types(&text).map_err(|e| match e {
        ConfigError::EmptySource(_) => ConfigError::EmptySource(format!(
            "{} (no lines with 'Chip_Type =')",
            path.display()
        )),
        other => other,
    })?;
    debug!("parsed {} chip types from {}", tokens.len(), path.display());
    Ok(tokens)
}

/// Accept an explicit ordered list, dropping entries that are blank once trimmed.
pub fn from_explicit_list<I, S>(items: I) -> Result<Vec<ChipTypeToken>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<ChipTypeToken> = items
        .into_iter()
        .filter(|item| !trim_token(item.as_ref()).is_empty())
        .map(|item| ChipTypeToken::new(item.as_ref()))
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::EmptySource("chip_type_list".to_string()));
    }
    Ok(tokens)
}
