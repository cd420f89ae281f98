//! Unattended BurnScc programming runs
//!
//! This crate drives the BurnScc desktop tool through accessibility APIs:
//! it resolves one CT artifact per chip type, fills BurnScc's form, presses
//! Burn and moves on to the next chip type with the next range index.

pub mod chip_list;
pub mod diagnostics;
pub mod element;
pub mod errors;
pub mod job;
pub mod locator;
pub mod platforms;
pub mod progress;
pub mod resolver;
pub mod sequencer;
pub mod setter;
#[cfg(test)]
mod tests;
pub mod token;

pub use diagnostics::{format_trace, DiagnosticLog};
pub use element::{Rect, Role, UIElement, UIElementImpl};
pub use errors::{AutomationError, BurnError, ConfigError, ResolutionError};
pub use job::{load_job, BurnJob, ChipSource, LoadedJob};
pub use locator::{FieldLocator, FieldQuery, LocatorConfig};
pub use platforms::{create_engine, AccessibilityEngine};
pub use progress::ProgressLog;
pub use resolver::{ArtifactResolver, ResolverConfig};
pub use sequencer::{BurnSequencer, BurnStep, RunOutcome, RunReport, SequencerConfig};
pub use setter::{SetterConfig, VerifiedFieldSetter};
pub use token::ChipTypeToken;
