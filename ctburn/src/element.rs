use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use tracing::instrument;

/// On-screen bounding rectangle of an element, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Vertical midpoint (integer division, like the platform reports it)
    pub fn mid_y(&self) -> i32 {
        (self.top + self.bottom) / 2
    }
}

/// The control types the burn workflow needs to filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Window,
    Text,
    Edit,
    ComboBox,
    Button,
    Other,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Window => "Window",
            Role::Text => "Text",
            Role::Edit => "Edit",
            Role::ComboBox => "ComboBox",
            Role::Button => "Button",
            Role::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Capability surface a platform binding has to provide for a single element.
///
/// The locator, the setter and the sequencer only ever talk to this trait, so
/// a test double can stand in for a live accessibility tree.
pub trait UIElementImpl: Send + Sync + Debug {
    fn role(&self) -> Role;
    /// Caption / label text of the element (window title for windows)
    fn name(&self) -> Option<String>;
    fn bounds(&self) -> Result<Rect, AutomationError>;
    /// All descendants of the given role, in document order
    fn descendants(&self, role: Role) -> Result<Vec<UIElement>, AutomationError>;
    fn click(&self) -> Result<(), AutomationError>;
    fn focus(&self) -> Result<(), AutomationError>;
    fn get_value(&self) -> Result<String, AutomationError>;
    fn set_value(&self, value: &str) -> Result<(), AutomationError>;
    fn close(&self) -> Result<(), AutomationError>;
    fn clone_box(&self) -> Box<dyn UIElementImpl>;
}

/// Handle to a control owned by the automated application.
///
/// Handles are only meaningful for the burn cycle that produced them and are
/// dropped when the cycle ends.
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

impl UIElement {
    /// Create a new UI element from a platform-specific implementation
    pub fn new(impl_: Box<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn role(&self) -> Role {
        self.inner.role()
    }

    /// Name with surrounding whitespace removed, empty when unavailable
    pub fn label_text(&self) -> String {
        self.inner
            .name()
            .map(|n| n.trim().to_string())
            .unwrap_or_default()
    }

    pub fn bounds(&self) -> Result<Rect, AutomationError> {
        self.inner.bounds()
    }

    pub fn descendants(&self, role: Role) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.descendants(role)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn click(&self) -> Result<(), AutomationError> {
        self.inner.click()
    }

    pub fn focus(&self) -> Result<(), AutomationError> {
        self.inner.focus()
    }

    pub fn get_value(&self) -> Result<String, AutomationError> {
        self.inner.get_value()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        self.inner.set_value(value)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn close(&self) -> Result<(), AutomationError> {
        self.inner.close()
    }
}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}
