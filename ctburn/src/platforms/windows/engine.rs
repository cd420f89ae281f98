#![allow(clippy::arc_with_non_send_sync)]

use crate::platforms::windows::types::ThreadSafeWinUIAutomation;
use crate::platforms::windows::utils::{
    convert_uiautomation_element, create_ui_automation_with_com_init, role_condition,
};
use crate::platforms::AccessibilityEngine;
use crate::{AutomationError, Role, UIElement};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uiautomation::types::TreeScope;

const WINDOW_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct WindowsEngine {
    pub automation: ThreadSafeWinUIAutomation,
}

impl WindowsEngine {
    pub fn new() -> Result<Self, AutomationError> {
        // COM has to be initialized on the thread that owns the engine
        let automation = create_ui_automation_with_com_init()?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }

    fn top_level_raw(&self) -> Result<Vec<uiautomation::UIElement>, AutomationError> {
        let root = self.automation.0.get_root_element().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get desktop root: {e}"))
        })?;
        let condition = role_condition(&self.automation.0, Role::Window)?;
        root.find_all(TreeScope::Children, &condition)
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))
    }
}

impl AccessibilityEngine for WindowsEngine {
    fn launch_application(&self, exe_path: &Path) -> Result<u32, AutomationError> {
        info!("Launching application: {}", exe_path.display());
        let mut command = Command::new(exe_path);
        if let Some(dir) = exe_path.parent() {
            command.current_dir(dir);
        }
        let child = command.spawn().map_err(|e| {
            AutomationError::PlatformError(format!(
                "Failed to launch application '{}': {e}",
                exe_path.display()
            ))
        })?;
        Ok(child.id())
    }

    fn wait_for_window(
        &self,
        pid: u32,
        title: &Regex,
        timeout: Duration,
    ) -> Result<UIElement, AutomationError> {
        let started = Instant::now();
        loop {
            let found = self.top_level_raw()?.into_iter().find(|window| {
                let owned = window
                    .get_process_id()
                    .map(|owner| owner as u32 == pid)
                    .unwrap_or(false);
                if !owned {
                    return false;
                }
                let name = window.get_name().unwrap_or_default();
                let visible = window.is_offscreen().map(|off| !off).unwrap_or(false);
                visible && title.is_match(&name)
            });

            if let Some(window) = found {
                debug!(
                    "window '{}' of pid {pid} visible after {:?}",
                    window.get_name().unwrap_or_default(),
                    started.elapsed()
                );
                return Ok(convert_uiautomation_element(window));
            }

            if started.elapsed() >= timeout {
                return Err(AutomationError::LaunchTimeout {
                    pattern: title.as_str().to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            thread::sleep(WINDOW_POLL_INTERVAL);
        }
    }

    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        let windows = self.top_level_raw()?;
        debug!("Found '{}' top-level windows", windows.len());
        Ok(windows
            .into_iter()
            .map(convert_uiautomation_element)
            .collect())
    }
}
