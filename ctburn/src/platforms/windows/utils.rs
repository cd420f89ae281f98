//! Utility functions and type conversions for Windows platform

use super::types::ThreadSafeWinUIElement;
use super::element::WindowsUIElement;
use crate::{AutomationError, Role, UIElement};
use std::sync::Arc;
use uiautomation::controls::ControlType;
use uiautomation::types::UIProperty;
use uiautomation::variants::Variant;
use uiautomation::{UIAutomation, UICondition};
use windows::core::HRESULT;
use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

/// RPC_E_CHANGED_MODE: COM was already initialized on this thread
const COM_ALREADY_INITIALIZED: HRESULT = HRESULT(0x80010106u32 as i32);

/// Converts a raw uiautomation::UIElement to a ctburn UIElement
pub fn convert_uiautomation_element(element: uiautomation::UIElement) -> UIElement {
    #[allow(clippy::arc_with_non_send_sync)]
    let arc_ele = ThreadSafeWinUIElement(Arc::new(element));
    UIElement::new(Box::new(WindowsUIElement { element: arc_ele }))
}

/// Helper function to create UIAutomation instance with proper COM initialization
pub(crate) fn create_ui_automation_with_com_init() -> Result<UIAutomation, AutomationError> {
    unsafe {
        let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
        if hr.is_err() && hr != COM_ALREADY_INITIALIZED {
            // Only return error if it's not the "already initialized" case
            return Err(AutomationError::PlatformError(format!(
                "Failed to initialize COM: {hr}"
            )));
        }
    }

    UIAutomation::new_direct().map_err(|e| AutomationError::PlatformError(e.to_string()))
}

/// Maps the workflow roles to Windows ControlType enums
pub(crate) fn map_role_to_control_type(role: Role) -> Option<ControlType> {
    match role {
        Role::Window => Some(ControlType::Window),
        Role::Text => Some(ControlType::Text),
        Role::Edit => Some(ControlType::Edit),
        Role::ComboBox => Some(ControlType::ComboBox),
        Role::Button => Some(ControlType::Button),
        Role::Other => None,
    }
}

pub(crate) fn map_control_type_to_role(control_type: ControlType) -> Role {
    match control_type {
        ControlType::Window => Role::Window,
        ControlType::Text => Role::Text,
        ControlType::Edit => Role::Edit,
        ControlType::ComboBox => Role::ComboBox,
        ControlType::Button => Role::Button,
        _ => Role::Other,
    }
}

/// Condition matching every element of the given role
pub(crate) fn role_condition(
    automation: &UIAutomation,
    role: Role,
) -> Result<UICondition, AutomationError> {
    let control_type = map_role_to_control_type(role).ok_or_else(|| {
        AutomationError::InvalidArgument(format!("Role '{role}' cannot be used as a filter"))
    })?;
    automation
        .create_property_condition(
            UIProperty::ControlType,
            Variant::from(control_type as i32),
            None,
        )
        .map_err(|e| {
            AutomationError::PlatformError(format!(
                "Failed to create condition for role '{role}': {e}"
            ))
        })
}
