//! Field writes that are read back before the run moves on
//!
//! BurnScc silently drops or truncates input it does not like, so a write
//! only counts once the control reports the value we put in.

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::locator::{FieldLocator, FieldQuery};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetterConfig {
    /// Write + read-back attempts before giving up
    pub retries: u32,
    /// Pause between the write and the read-back
    pub settle_ms: u64,
}

impl Default for SetterConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            settle_ms: 200,
        }
    }
}

/// Path-style comparison form: unified separators, no trailing separator,
/// case-folded.
pub fn normalize_field_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    value
        .replace('/', "\\")
        .trim_end_matches('\\')
        .to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct VerifiedFieldSetter {
    locator: FieldLocator,
    config: SetterConfig,
}

impl VerifiedFieldSetter {
    pub fn new(locator: FieldLocator, config: SetterConfig) -> Self {
        Self { locator, config }
    }

    pub fn locator(&self) -> &FieldLocator {
        &self.locator
    }

    /// Write `value` into the input found by `query` and confirm it stuck.
    ///
    /// Fails with `ElementNotFound` as soon as the input cannot be located and
    /// with `VerificationFailed` once every attempt read back something else.
    #[instrument(level = "debug", skip(self, window))]
    pub fn set_verified(
        &self,
        window: &UIElement,
        query: &FieldQuery,
        value: &str,
    ) -> Result<(), AutomationError> {
        let expected = normalize_field_value(value);
        let attempts = self.config.retries.max(1);
        let mut last_seen = String::new();

        for attempt in 1..=attempts {
            let input = self.locate(window, query)?;
            if let Err(e) = input.set_value(value) {
                warn!("write to '{query}' failed on attempt {attempt}: {e}");
            }

            thread::sleep(Duration::from_millis(self.config.settle_ms));

            let actual = self.locate(window, query)?.get_value().unwrap_or_default();
            if normalize_field_value(&actual) == expected {
                debug!("'{query}' verified on attempt {attempt}");
                return Ok(());
            }
            debug!("'{query}' read back '{actual}' on attempt {attempt}, expected '{value}'");
            last_seen = actual;
        }

        Err(AutomationError::VerificationFailed {
            label: query.to_string(),
            expected: value.to_string(),
            actual: last_seen,
            attempts,
        })
    }

    /// Write without reading back.
    pub fn write_unverified(&self, input: &UIElement, value: &str) -> Result<(), AutomationError> {
        input.set_value(value)
    }

    fn locate(&self, window: &UIElement, query: &FieldQuery) -> Result<UIElement, AutomationError> {
        self.locator.find_input(window, query)?.ok_or_else(|| {
            AutomationError::ElementNotFound(format!("Could not find input field for label {query}"))
        })
    }
}
