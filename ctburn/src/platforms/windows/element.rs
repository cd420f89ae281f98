//! Windows UI Element implementation

use super::types::ThreadSafeWinUIElement;
use super::utils::{
    convert_uiautomation_element, create_ui_automation_with_com_init, map_control_type_to_role,
    role_condition,
};
use crate::element::UIElementImpl;
use crate::{AutomationError, Rect, Role, UIElement};
use std::fmt::Debug;
use tracing::debug;
use uiautomation::controls::ControlType;
use uiautomation::patterns;
use uiautomation::types::TreeScope;

pub struct WindowsUIElement {
    pub(crate) element: ThreadSafeWinUIElement,
}

impl WindowsUIElement {
    /// Select-all, clear and type, for controls without a usable ValuePattern
    fn type_over(&self, value: &str) -> Result<(), AutomationError> {
        self.element.0.try_focus();
        self.element
            .0
            .send_keys("{ctrl}(a){backspace}", 10)
            .map_err(|e| AutomationError::PlatformError(format!("Failed to clear field: {e}")))?;
        self.element
            .0
            .send_text(value, 10)
            .map_err(|e| AutomationError::PlatformError(format!("Failed to type value: {e}")))
    }
}

impl Debug for WindowsUIElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsUIElement")
            .field("name", &self.element.0.get_name().unwrap_or_default())
            .finish()
    }
}

impl UIElementImpl for WindowsUIElement {
    fn role(&self) -> Role {
        self.element
            .0
            .get_control_type()
            .map(map_control_type_to_role)
            .unwrap_or(Role::Other)
    }

    fn name(&self) -> Option<String> {
        self.element.0.get_name().ok()
    }

    fn bounds(&self) -> Result<Rect, AutomationError> {
        let rect = self
            .element
            .0
            .get_bounding_rectangle()
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
        Ok(Rect::new(
            rect.get_left(),
            rect.get_top(),
            rect.get_right(),
            rect.get_bottom(),
        ))
    }

    fn descendants(&self, role: Role) -> Result<Vec<UIElement>, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        let condition = role_condition(&automation, role)?;
        let found = self
            .element
            .0
            .find_all(TreeScope::Descendants, &condition)
            .map_err(|e| {
                AutomationError::PlatformError(format!("Failed to list {role} descendants: {e}"))
            })?;
        debug!("found {} {} descendants", found.len(), role);
        Ok(found.into_iter().map(convert_uiautomation_element).collect())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.element.0.try_focus();
        debug!("attempting to click element: {:?}", self.element.0);
        if self.element.0.click().is_ok() {
            return Ok(());
        }

        // Buttons that refuse a synthesized mouse click usually still invoke
        debug!("mouse click failed, falling back to InvokePattern");
        let invoke = self
            .element
            .0
            .get_pattern::<patterns::UIInvokePattern>()
            .map_err(|e| {
                AutomationError::PlatformError(format!(
                    "Click failed and element does not support InvokePattern: {e}"
                ))
            })?;
        invoke
            .invoke()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.element
            .0
            .set_focus()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))
    }

    fn get_value(&self) -> Result<String, AutomationError> {
        if let Ok(value_pattern) = self.element.0.get_pattern::<patterns::UIValuePattern>() {
            if let Ok(value) = value_pattern.get_value() {
                return Ok(value);
            }
        }
        self.element
            .0
            .get_name()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to read value: {e}")))
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        debug!(
            "setting value: {:#?} to ui element {:#?}",
            &value, &self.element.0
        );
        self.element.0.try_focus();
        let _ = self.element.0.click();

        match self.element.0.get_pattern::<patterns::UIValuePattern>() {
            Ok(value_pattern) => match value_pattern.set_value(value) {
                Ok(()) => Ok(()),
                Err(e) => {
                    debug!("ValuePattern.set_value failed ({e}), typing instead");
                    self.type_over(value)
                }
            },
            Err(_) => self.type_over(value),
        }
    }

    fn close(&self) -> Result<(), AutomationError> {
        let control_type = self.element.0.get_control_type().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get control type: {e}"))
        })?;

        match control_type {
            ControlType::Window | ControlType::Pane => {
                if let Ok(window_pattern) =
                    self.element.0.get_pattern::<patterns::UIWindowPattern>()
                {
                    debug!("Attempting to close window using WindowPattern");
                    if window_pattern.close().is_ok() {
                        return Ok(());
                    }
                }

                debug!("WindowPattern close unavailable, trying Alt+F4 as fallback");
                self.element.0.try_focus();
                self.element.0.send_keys("{alt}({F4})", 10).map_err(|e| {
                    AutomationError::PlatformError(format!(
                        "Failed to close window: WindowPattern and Alt+F4 both failed: {e}"
                    ))
                })
            }
            _ => Err(AutomationError::InvalidArgument(format!(
                "Element of type '{control_type}' cannot be closed"
            ))),
        }
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(WindowsUIElement {
            element: self.element.clone(),
        })
    }
}
