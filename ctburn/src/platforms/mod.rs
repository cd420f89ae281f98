use crate::{AutomationError, UIElement};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The common trait that all platform-specific engines must implement
pub trait AccessibilityEngine: Send + Sync {
    /// Start the executable and return its process id
    fn launch_application(&self, exe_path: &Path) -> Result<u32, AutomationError>;

    /// Wait until a top-level window of process `pid` whose title matches
    /// `title` is visible
    ///
    /// Returns `AutomationError::LaunchTimeout` when nothing shows up in time.
    fn wait_for_window(
        &self,
        pid: u32,
        title: &Regex,
        timeout: Duration,
    ) -> Result<UIElement, AutomationError>;

    /// All top-level windows currently on the desktop
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError>;
}

#[cfg(target_os = "windows")]
pub mod windows;

/// Create the appropriate engine for the current platform
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsEngine::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(AutomationError::UnsupportedPlatform(format!(
            "BurnScc automation requires Windows UI Automation (current OS: {})",
            std::env::consts::OS
        )))
    }
}
