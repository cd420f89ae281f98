//! Windows platform implementation for UI automation
//!
//! This module provides the BurnScc automation surface using the Windows
//! UI Automation API through the uiautomation crate.

pub mod element;
pub mod engine;
pub mod types;
pub mod utils;

// Re-export the main types that external code needs
pub use element::WindowsUIElement;
pub use engine::WindowsEngine;
