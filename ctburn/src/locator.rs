//! Finding the input control that belongs to a visible label
//!
//! BurnScc exposes its fields as loose `Text` labels next to `Edit` and
//! `ComboBox` controls with no accessible relationship between them, so the
//! association is rebuilt from screen geometry.

use crate::element::{Rect, Role, UIElement};
use crate::errors::AutomationError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

/// Geometry tolerances, in pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// How far left of a pattern-matched label an input may start
    pub pattern_left_tolerance: i32,
    /// Max top-edge offset between a pattern-matched label and its input
    pub pattern_row_tolerance: i32,
    /// How far left of an exact-matched label an input may start
    pub exact_left_tolerance: i32,
    /// Max midpoint offset for an input to count as "same row"
    pub exact_row_tolerance: i32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            pattern_left_tolerance: 30,
            pattern_row_tolerance: 80,
            exact_left_tolerance: 20,
            exact_row_tolerance: 28,
        }
    }
}

/// How a field's label is recognized
#[derive(Debug, Clone)]
pub enum FieldQuery {
    /// Normalized label text must equal this
    Exact(String),
    /// Case-insensitive regex searched in the label text
    Pattern(Regex),
}

impl FieldQuery {
    pub fn exact(label: impl Into<String>) -> Self {
        FieldQuery::Exact(label.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, AutomationError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(FieldQuery::Pattern)
            .map_err(|e| {
                AutomationError::InvalidArgument(format!("Invalid label pattern '{pattern}': {e}"))
            })
    }
}

impl fmt::Display for FieldQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldQuery::Exact(label) => f.write_str(label),
            FieldQuery::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Collapse whitespace, drop trailing colons and case-fold.
pub fn normalize_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase()
}

/// An element together with where it sits on screen
#[derive(Debug, Clone)]
struct Placed {
    element: UIElement,
    rect: Rect,
}

fn place_all(elements: Vec<UIElement>) -> Vec<Placed> {
    elements
        .into_iter()
        .filter_map(|element| match element.bounds() {
            Ok(rect) => Some(Placed { element, rect }),
            Err(e) => {
                debug!("skipping element without bounds: {e}");
                None
            }
        })
        .collect()
}

/// Keep the first element seen for each bounding rectangle
fn dedup_by_rect(items: Vec<Placed>) -> Vec<Placed> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.rect))
        .collect()
}

/// Nearest input to the right of / below a label, Manhattan-style distance
fn nearest_by_offset<'a>(
    label: &Rect,
    inputs: &'a [Placed],
    left_tolerance: i32,
    row_tolerance: i32,
) -> Option<(i32, &'a Placed)> {
    let mut best: Option<(i32, &Placed)> = None;
    for input in inputs {
        if input.rect.left < label.left - left_tolerance {
            continue;
        }
        if (input.rect.top - label.top).abs() > row_tolerance {
            continue;
        }
        let distance = (input.rect.left - label.right).abs() + (input.rect.top - label.top).abs();
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, input));
        }
    }
    best
}

#[derive(Debug, Clone, Default)]
pub struct FieldLocator {
    config: LocatorConfig,
}

impl FieldLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn find_input(
        &self,
        window: &UIElement,
        query: &FieldQuery,
    ) -> Result<Option<UIElement>, AutomationError> {
        match query {
            FieldQuery::Exact(label) => self.find_by_exact_label(window, label),
            FieldQuery::Pattern(pattern) => self.find_by_pattern(window, pattern),
        }
    }

    /// Pattern mode: first matching label with an eligible `Edit` wins.
    #[instrument(level = "debug", skip(self, window, pattern), fields(pattern = %pattern.as_str()))]
    pub fn find_by_pattern(
        &self,
        window: &UIElement,
        pattern: &Regex,
    ) -> Result<Option<UIElement>, AutomationError> {
        let labels = place_all(window.descendants(Role::Text)?);
        let edits = dedup_by_rect(place_all(window.descendants(Role::Edit)?));

        for label in &labels {
            let text = label.element.label_text();
            if !pattern.is_match(&text) {
                continue;
            }
            if let Some((distance, edit)) = nearest_by_offset(
                &label.rect,
                &edits,
                self.config.pattern_left_tolerance,
                self.config.pattern_row_tolerance,
            ) {
                debug!("label '{text}' -> input at {:?} (distance {distance})", edit.rect);
                return Ok(Some(edit.element.clone()));
            }
        }
        Ok(None)
    }

    /// Exact mode: best candidate for the first label whose normalized text
    /// equals `label`.
    pub fn find_by_exact_label(
        &self,
        window: &UIElement,
        label: &str,
    ) -> Result<Option<UIElement>, AutomationError> {
        Ok(self
            .exact_label_candidates(window, label)?
            .into_iter()
            .next())
    }

    /// All inputs that could belong to `label`, best first, one per screen
    /// rectangle.
    #[instrument(level = "debug", skip(self, window))]
    pub fn exact_label_candidates(
        &self,
        window: &UIElement,
        label: &str,
    ) -> Result<Vec<UIElement>, AutomationError> {
        let expected = normalize_label(label);
        let labels: Vec<Placed> = place_all(window.descendants(Role::Text)?)
            .into_iter()
            .filter(|l| normalize_label(&l.element.label_text()) == expected)
            .collect();
        if labels.is_empty() {
            debug!("no label equal to '{expected}'");
            return Ok(Vec::new());
        }

        let mut inputs = place_all(window.descendants(Role::Edit)?);
        inputs.extend(place_all(window.descendants(Role::ComboBox)?));

        let mut collected: Vec<Placed> = Vec::new();
        for label in &labels {
            let mut ranked: Vec<(i32, i32, &Placed)> = inputs
                .iter()
                .filter(|c| c.rect.left >= label.rect.left - self.config.exact_left_tolerance)
                .map(|c| {
                    let row_distance = (c.rect.mid_y() - label.rect.mid_y()).abs();
                    let gap = (c.rect.left - label.rect.right).max(0);
                    (row_distance, gap, c)
                })
                .collect();
            if ranked.is_empty() {
                continue;
            }

            if ranked
                .iter()
                .any(|(row, _, _)| *row <= self.config.exact_row_tolerance)
            {
                ranked.retain(|(row, _, _)| *row <= self.config.exact_row_tolerance);
            }
            ranked.sort_by_key(|(row, gap, _)| (*row, *gap));

            for (_, _, chosen) in ranked {
                if let Some(resolved) = resolve_editable(chosen)? {
                    collected.push(resolved);
                }
            }
        }

        Ok(dedup_by_rect(collected)
            .into_iter()
            .map(|p| p.element)
            .collect())
    }

    /// Fallback for the artifact path field: any "file name" label that is
    /// not about logging, preferring "full path for the file name".
    #[instrument(level = "debug", skip(self, window))]
    pub fn find_file_name_field(
        &self,
        window: &UIElement,
    ) -> Result<Option<UIElement>, AutomationError> {
        let labels = place_all(window.descendants(Role::Text)?);
        let edits = dedup_by_rect(place_all(window.descendants(Role::Edit)?));

        let mut preferred: Vec<(i32, &Placed)> = Vec::new();
        let mut fallback: Vec<(i32, &Placed)> = Vec::new();
        for label in &labels {
            let text = label
                .element
                .label_text()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.contains("file name") || text.contains("log") {
                continue;
            }
            let Some(hit) = nearest_by_offset(
                &label.rect,
                &edits,
                self.config.pattern_left_tolerance,
                self.config.pattern_row_tolerance,
            ) else {
                continue;
            };
            if text.contains("full path for the file name") {
                preferred.push(hit);
            } else {
                fallback.push(hit);
            }
        }

        let pool = if preferred.is_empty() {
            &mut fallback
        } else {
            &mut preferred
        };
        pool.sort_by_key(|(distance, _)| *distance);
        Ok(pool.first().map(|(_, p)| p.element.clone()))
    }

    /// First button whose trimmed caption equals `caption`.
    pub fn find_button(
        &self,
        window: &UIElement,
        caption: &str,
        ignore_case: bool,
    ) -> Result<Option<UIElement>, AutomationError> {
        Ok(window
            .descendants(Role::Button)?
            .into_iter()
            .find(|button| {
                let text = button.label_text();
                if ignore_case {
                    text.eq_ignore_ascii_case(caption)
                } else {
                    text == caption
                }
            }))
    }
}

/// ComboBoxes are written through their embedded edit box
fn resolve_editable(candidate: &Placed) -> Result<Option<Placed>, AutomationError> {
    if candidate.element.role() != Role::ComboBox {
        return Ok(Some(candidate.clone()));
    }
    let inner = candidate.element.descendants(Role::Edit)?;
    Ok(place_all(inner).into_iter().next())
}
