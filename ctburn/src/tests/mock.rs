//! In-memory stand-ins for BurnScc's accessibility tree

use crate::element::UIElementImpl;
use crate::platforms::AccessibilityEngine;
use crate::{AutomationError, Rect, Role, UIElement};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What a control does with a value written into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    Accept,
    Ignore,
    /// Keeps only the first n characters
    Truncate(usize),
    /// Ignores the first n writes
    AcceptAfter(usize),
}

#[derive(Debug)]
pub struct MockState {
    pub value: String,
    pub writes: Vec<String>,
    pub clicks: usize,
    pub closed: bool,
    behavior: WriteBehavior,
    fail_close: bool,
}

#[derive(Debug, Clone)]
pub struct MockElement {
    role: Role,
    name: Option<String>,
    rect: Rect,
    children: Vec<MockElement>,
    state: Arc<Mutex<MockState>>,
}

impl MockElement {
    pub fn new(role: Role, name: Option<&str>, rect: Rect) -> Self {
        Self {
            role,
            name: name.map(str::to_string),
            rect,
            children: Vec::new(),
            state: Arc::new(Mutex::new(MockState {
                value: String::new(),
                writes: Vec::new(),
                clicks: 0,
                closed: false,
                behavior: WriteBehavior::Accept,
                fail_close: false,
            })),
        }
    }

    pub fn label(text: &str, rect: Rect) -> Self {
        Self::new(Role::Text, Some(text), rect)
    }

    pub fn edit(rect: Rect) -> Self {
        Self::new(Role::Edit, None, rect)
    }

    pub fn button(caption: &str, rect: Rect) -> Self {
        Self::new(Role::Button, Some(caption), rect)
    }

    pub fn with_children(mut self, children: Vec<MockElement>) -> Self {
        self.children = children;
        self
    }

    pub fn with_behavior(self, behavior: WriteBehavior) -> Self {
        self.state().behavior = behavior;
        self
    }

    pub fn failing_close(self) -> Self {
        self.state().fail_close = true;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn value(&self) -> String {
        self.state().value.clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    pub fn clicks(&self) -> usize {
        self.state().clicks
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn to_element(&self) -> UIElement {
        UIElement::new(Box::new(self.clone()))
    }

    fn collect(&self, role: Role, out: &mut Vec<UIElement>) {
        for child in &self.children {
            if child.role == role {
                out.push(child.to_element());
            }
            child.collect(role, out);
        }
    }
}

impl UIElementImpl for MockElement {
    fn role(&self) -> Role {
        self.role
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn bounds(&self) -> Result<Rect, AutomationError> {
        Ok(self.rect)
    }

    fn descendants(&self, role: Role) -> Result<Vec<UIElement>, AutomationError> {
        let mut out = Vec::new();
        self.collect(role, &mut out);
        Ok(out)
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.state().clicks += 1;
        Ok(())
    }

    fn focus(&self) -> Result<(), AutomationError> {
        Ok(())
    }

    fn get_value(&self) -> Result<String, AutomationError> {
        Ok(self.value())
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        let mut state = self.state();
        state.writes.push(value.to_string());
        match state.behavior {
            WriteBehavior::Accept => state.value = value.to_string(),
            WriteBehavior::Ignore => {}
            WriteBehavior::Truncate(n) => state.value = value.chars().take(n).collect(),
            WriteBehavior::AcceptAfter(n) => {
                if state.writes.len() > n {
                    state.value = value.to_string();
                }
            }
        }
        Ok(())
    }

    fn close(&self) -> Result<(), AutomationError> {
        let mut state = self.state();
        if state.fail_close {
            return Err(AutomationError::PlatformError("window refused to close".into()));
        }
        state.closed = true;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}

/// How the next BurnScc window should look and behave
#[derive(Debug, Clone)]
pub struct FormLayout {
    pub artifact_label: String,
    pub ip: WriteBehavior,
    pub artifact: WriteBehavior,
    pub range: WriteBehavior,
    pub burn_button: bool,
    pub fail_close: bool,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self {
            artifact_label: "Full path for the File Name".to_string(),
            ip: WriteBehavior::Accept,
            artifact: WriteBehavior::Accept,
            range: WriteBehavior::Accept,
            burn_button: true,
            fail_close: false,
        }
    }
}

/// Handles into one BurnScc window and its interesting controls
#[derive(Debug, Clone)]
pub struct BurnForm {
    pub window: MockElement,
    pub ip: MockElement,
    /// The edit box embedded in the artifact path combo box
    pub artifact: MockElement,
    pub log_file: MockElement,
    pub range: MockElement,
    pub burn: MockElement,
}

impl BurnForm {
    pub fn build(layout: &FormLayout) -> Self {
        let ip = MockElement::edit(Rect::new(100, 10, 300, 30)).with_behavior(layout.ip);
        let artifact = MockElement::edit(Rect::new(212, 50, 480, 70)).with_behavior(layout.artifact);
        let combo = MockElement::new(Role::ComboBox, None, Rect::new(210, 48, 500, 72))
            .with_children(vec![artifact.clone()]);
        let log_file = MockElement::edit(Rect::new(130, 90, 500, 110));
        let range = MockElement::edit(Rect::new(130, 130, 200, 150)).with_behavior(layout.range);
        let burn = MockElement::button("Burn", Rect::new(10, 180, 90, 205));

        let mut children = vec![
            MockElement::label("IP Address:", Rect::new(10, 10, 90, 30)),
            ip.clone(),
            MockElement::label(&layout.artifact_label, Rect::new(10, 50, 200, 70)),
            combo,
            MockElement::label("Log File Name", Rect::new(10, 90, 120, 110)),
            log_file.clone(),
            MockElement::label("Ranges of chips", Rect::new(10, 130, 120, 150)),
            range.clone(),
            MockElement::button("Cancel", Rect::new(100, 180, 180, 205)),
        ];
        if layout.burn_button {
            children.push(burn.clone());
        }

        let mut window = MockElement::new(Role::Window, Some("BurnScc"), Rect::new(0, 0, 640, 240))
            .with_children(children);
        if layout.fail_close {
            window = window.failing_close();
        }

        Self {
            window,
            ip,
            artifact,
            log_file,
            range,
            burn,
        }
    }
}

type FormFactory = Box<dyn Fn(usize) -> FormLayout + Send + Sync>;

/// Pid of windows that were not started by `launch_application`
pub const FOREIGN_PID: u32 = 4;

/// Engine whose every launch opens a fresh mock BurnScc window
pub struct MockEngine {
    factory: FormFactory,
    window_appears: bool,
    launches: Mutex<Vec<PathBuf>>,
    forms: Mutex<Vec<(u32, BurnForm)>>,
    others: Mutex<Vec<(u32, MockElement)>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::with_forms(|_| FormLayout::default())
    }

    /// `factory` gets the zero-based launch number
    pub fn with_forms(factory: impl Fn(usize) -> FormLayout + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            window_appears: true,
            launches: Mutex::new(Vec::new()),
            forms: Mutex::new(Vec::new()),
            others: Mutex::new(Vec::new()),
        }
    }

    pub fn never_shows_window(mut self) -> Self {
        self.window_appears = false;
        self
    }

    /// A window owned by some other process, listed before any BurnScc form
    pub fn add_popup(&self, popup: MockElement) {
        self.add_window(FOREIGN_PID, popup);
    }

    pub fn add_window(&self, pid: u32, window: MockElement) {
        self.others.lock().unwrap().push((pid, window));
    }

    pub fn launches(&self) -> Vec<PathBuf> {
        self.launches.lock().unwrap().clone()
    }

    pub fn forms(&self) -> Vec<BurnForm> {
        self.forms
            .lock()
            .unwrap()
            .iter()
            .map(|(_, form)| form.clone())
            .collect()
    }

    fn all_windows(&self) -> Vec<(u32, MockElement)> {
        let mut windows = self.others.lock().unwrap().clone();
        windows.extend(
            self.forms
                .lock()
                .unwrap()
                .iter()
                .map(|(pid, form)| (*pid, form.window.clone())),
        );
        windows
    }
}

impl AccessibilityEngine for MockEngine {
    fn launch_application(&self, exe_path: &Path) -> Result<u32, AutomationError> {
        let mut launches = self.launches.lock().unwrap();
        launches.push(exe_path.to_path_buf());
        let pid = 1000 + launches.len() as u32;
        if self.window_appears {
            let mut forms = self.forms.lock().unwrap();
            let form = BurnForm::build(&(self.factory)(forms.len()));
            forms.push((pid, form));
        }
        Ok(pid)
    }

    fn wait_for_window(
        &self,
        pid: u32,
        title: &Regex,
        timeout: Duration,
    ) -> Result<UIElement, AutomationError> {
        self.all_windows()
            .into_iter()
            .find(|(owner, window)| {
                *owner == pid && title.is_match(window.name.as_deref().unwrap_or_default())
            })
            .map(|(_, window)| window.to_element())
            .ok_or_else(|| AutomationError::LaunchTimeout {
                pattern: title.as_str().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .all_windows()
            .iter()
            .map(|(_, window)| window.to_element())
            .collect())
    }
}
