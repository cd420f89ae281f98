//! The per-chip burn cycle
//!
//! For every chip type in job order: resolve the artifact, start BurnScc,
//! fill in address, artifact path and range index, press Burn, dismiss the
//! confirmation and close the application. Any fatal step aborts the whole
//! run, so the completed chips are always a prefix of the job.

use crate::element::UIElement;
use crate::errors::{AutomationError, BurnError};
use crate::job::BurnJob;
use crate::locator::{FieldLocator, FieldQuery, LocatorConfig};
use crate::platforms::AccessibilityEngine;
use crate::progress::ProgressLog;
use crate::resolver::{ArtifactResolver, ResolverConfig};
use crate::setter::{SetterConfig, VerifiedFieldSetter};
use crate::token::ChipTypeToken;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Everything about BurnScc's UI the sequencer relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Title of BurnScc's main window, case-sensitive
    pub window_title_pattern: String,
    pub launch_timeout_ms: u64,
    pub target_label_pattern: String,
    pub artifact_label: String,
    pub range_label_pattern: String,
    pub action_caption: String,
    pub action_timeout_ms: u64,
    pub action_poll_ms: u64,
    /// Wait after pressing Burn before looking for the confirmation
    pub settle_delay_ms: u64,
    /// Lower-case words that mark a confirmation window title
    pub confirmation_keywords: Vec<String>,
    pub confirmation_caption: String,
    pub setter: SetterConfig,
    pub locator: LocatorConfig,
    pub resolver: ResolverConfig,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            window_title_pattern: ".*Burn.*".to_string(),
            launch_timeout_ms: 30_000,
            target_label_pattern: r"IP\s*Address".to_string(),
            artifact_label: "Full path for the File Name".to_string(),
            range_label_pattern: r"Ranges?\s*of\s*chips".to_string(),
            action_caption: "Burn".to_string(),
            action_timeout_ms: 5_000,
            action_poll_ms: 250,
            settle_delay_ms: 5_000,
            confirmation_keywords: vec![
                "burn".to_string(),
                "success".to_string(),
                "complete".to_string(),
            ],
            confirmation_caption: "OK".to_string(),
            setter: SetterConfig::default(),
            locator: LocatorConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Steps of one chip-type cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BurnStep {
    ResolveArtifact,
    LaunchApp,
    AwaitVisible,
    SetTarget,
    SetArtifactPath,
    SetRangeIndex,
    TriggerAction,
    AwaitCompletion,
    DismissConfirmation,
    CloseApp,
    AdvanceIndex,
}

impl fmt::Display for BurnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A chip type that went through the whole cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedChip {
    pub chip_type: ChipTypeToken,
    pub artifact: PathBuf,
    pub range_index: u64,
}

#[derive(Debug)]
pub enum RunOutcome {
    Done,
    Aborted {
        chip_type: ChipTypeToken,
        step: BurnStep,
        error: BurnError,
    },
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Range index after the run: start + number of completed chips
    pub range_index: u64,
    pub completed: Vec<CompletedChip>,
}

impl RunReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, RunOutcome::Done)
    }

    pub fn error(&self) -> Option<&BurnError> {
        match &self.outcome {
            RunOutcome::Done => None,
            RunOutcome::Aborted { error, .. } => Some(error),
        }
    }
}

pub struct BurnSequencer {
    engine: Arc<dyn AccessibilityEngine>,
    resolver: ArtifactResolver,
    setter: VerifiedFieldSetter,
    config: SequencerConfig,
    window_title: Regex,
    target_query: FieldQuery,
    range_query: FieldQuery,
    artifact_query: FieldQuery,
    log: ProgressLog,
}

impl BurnSequencer {
    pub fn new(
        engine: Arc<dyn AccessibilityEngine>,
        config: SequencerConfig,
        log: ProgressLog,
    ) -> Result<Self, AutomationError> {
        let window_title = Regex::new(&config.window_title_pattern).map_err(|e| {
            AutomationError::InvalidArgument(format!(
                "Invalid window title pattern '{}': {e}",
                config.window_title_pattern
            ))
        })?;
        let target_query = FieldQuery::pattern(&config.target_label_pattern)?;
        let range_query = FieldQuery::pattern(&config.range_label_pattern)?;
        let artifact_query = FieldQuery::exact(config.artifact_label.clone());
        let locator = FieldLocator::new(config.locator.clone());

        Ok(Self {
            engine,
            resolver: ArtifactResolver::new(config.resolver.clone()),
            setter: VerifiedFieldSetter::new(locator, config.setter.clone()),
            config,
            window_title,
            target_query,
            range_query,
            artifact_query,
            log,
        })
    }

    /// Burn every chip type of `job`, stopping at the first fatal failure.
    #[instrument(skip(self, job), fields(chips = job.chip_types().len()))]
    pub fn run(&self, job: &BurnJob) -> RunReport {
        self.log.line(format!(
            "Loaded {} chip type(s) from list.",
            job.chip_types().len()
        ));

        let mut range_index = job.starting_index();
        let mut completed = Vec::with_capacity(job.chip_types().len());

        for chip_type in job.chip_types() {
            self.log
                .line(format!("Processing chip type: {chip_type}"));
            let mut step = BurnStep::ResolveArtifact;

            match self.burn_one(job, chip_type, range_index, &mut step) {
                Ok(artifact) => {
                    self.enter(&mut step, BurnStep::AdvanceIndex);
                    completed.push(CompletedChip {
                        chip_type: chip_type.clone(),
                        artifact,
                        range_index,
                    });
                    range_index += 1;
                }
                Err(error) => {
                    self.log.line(format!(
                        "Aborted at {step} for chip type {chip_type}: {error}"
                    ));
                    return RunReport {
                        outcome: RunOutcome::Aborted {
                            chip_type: chip_type.clone(),
                            step,
                            error,
                        },
                        range_index,
                        completed,
                    };
                }
            }
        }

        self.log.line("All chip types processed.");
        RunReport {
            outcome: RunOutcome::Done,
            range_index,
            completed,
        }
    }

    fn enter(&self, current: &mut BurnStep, next: BurnStep) {
        info!(from = %current, to = %next, "step");
        *current = next;
    }

    /// One full cycle; `step` tracks where a failure happened.
    fn burn_one(
        &self,
        job: &BurnJob,
        chip_type: &ChipTypeToken,
        range_index: u64,
        step: &mut BurnStep,
    ) -> Result<PathBuf, BurnError> {
        let artifact = self.resolver.resolve(chip_type, job.ct_search_root())?;
        self.log
            .line(format!("Found CT file: {}", artifact.display()));

        self.enter(step, BurnStep::LaunchApp);
        let pid = self.engine.launch_application(job.burn_exe_path())?;

        self.enter(step, BurnStep::AwaitVisible);
        let window = self.engine.wait_for_window(
            pid,
            &self.window_title,
            Duration::from_millis(self.config.launch_timeout_ms),
        )?;
        if let Err(e) = window.focus() {
            warn!("could not focus BurnScc window: {e}");
        }

        self.enter(step, BurnStep::SetTarget);
        self.setter
            .set_verified(&window, &self.target_query, job.ip_address())?;
        self.log
            .line(format!("Set IP address to: {}", job.ip_address()));

        self.enter(step, BurnStep::SetArtifactPath);
        self.set_artifact_path(&window, &artifact)?;

        self.enter(step, BurnStep::SetRangeIndex);
        self.setter
            .set_verified(&window, &self.range_query, &range_index.to_string())?;
        self.log.line(format!("Set range index to: {range_index}"));

        self.enter(step, BurnStep::TriggerAction);
        let button = self.wait_for_action_button(&window)?;
        button.click()?;
        self.log.line(format!(
            "{} clicked for {chip_type}, range index {range_index}.",
            self.config.action_caption
        ));

        self.enter(step, BurnStep::AwaitCompletion);
        thread::sleep(Duration::from_millis(self.config.settle_delay_ms));

        self.enter(step, BurnStep::DismissConfirmation);
        let dismissed = self.dismiss_confirmations();
        if dismissed == 0 {
            debug!("no confirmation popup found");
        }

        self.enter(step, BurnStep::CloseApp);
        if let Err(e) = window.close() {
            warn!("closing BurnScc failed: {e}");
            self.log
                .line(format!("Could not close BurnScc window (ignored): {e}"));
        }

        Ok(artifact)
    }

    /// Verified write on the exact label, or an unverified write on the best
    /// "file name" field when the label text differs in this BurnScc build.
    fn set_artifact_path(&self, window: &UIElement, artifact: &Path) -> Result<(), BurnError> {
        let value = artifact.to_string_lossy();
        match self
            .setter
            .set_verified(window, &self.artifact_query, &value)
        {
            Ok(()) => {
                self.log.line(format!(
                    "Set '{}' to: {value}",
                    self.config.artifact_label
                ));
                Ok(())
            }
            Err(
                e @ (AutomationError::VerificationFailed { .. }
                | AutomationError::ElementNotFound(_)),
            ) => {
                warn!("exact artifact field unusable ({e}), trying file name fallback");
                let fallback = self
                    .setter
                    .locator()
                    .find_file_name_field(window)?
                    .ok_or_else(|| {
                        AutomationError::ElementNotFound(
                            "Could not find File Name input field (non-log fallback).".to_string(),
                        )
                    })?;
                self.setter.write_unverified(&fallback, &value)?;
                self.log.line(format!(
                    "Set File Name field (non-log fallback) to: {value}"
                ));
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    fn wait_for_action_button(&self, window: &UIElement) -> Result<UIElement, AutomationError> {
        let timeout = Duration::from_millis(self.config.action_timeout_ms);
        let started = Instant::now();
        loop {
            if let Some(button) = self.setter.locator().find_button(
                window,
                &self.config.action_caption,
                false,
            )? {
                return Ok(button);
            }
            if started.elapsed() >= timeout {
                return Err(AutomationError::ElementNotFound(format!(
                    "Could not find {} button.",
                    self.config.action_caption
                )));
            }
            thread::sleep(Duration::from_millis(self.config.action_poll_ms));
        }
    }

    /// Click the OK button on every confirmation-looking window. Never fails.
    fn dismiss_confirmations(&self) -> usize {
        let windows = match self.engine.top_level_windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("could not enumerate windows for confirmation popups: {e}");
                return 0;
            }
        };

        let mut dismissed = 0;
        for popup in windows {
            let title = popup.label_text().to_lowercase();
            if !self
                .config
                .confirmation_keywords
                .iter()
                .any(|keyword| title.contains(&keyword.to_lowercase()))
            {
                continue;
            }
            match self
                .setter
                .locator()
                .find_button(&popup, &self.config.confirmation_caption, true)
            {
                Ok(Some(button)) => match button.click() {
                    Ok(()) => {
                        info!("dismissed confirmation '{title}'");
                        dismissed += 1;
                    }
                    Err(e) => warn!("clicking OK on '{title}' failed: {e}"),
                },
                Ok(None) => {}
                Err(e) => warn!("could not inspect window '{title}': {e}"),
            }
        }
        dismissed
    }
}
