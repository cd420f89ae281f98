//! Mapping a chip-type token to exactly one `.ct` artifact under a search root
//!
//! Matching runs in two tiers. An exact stem match always wins; when several
//! files share the same stem the shortest file name is taken. Only when no
//! stem matches exactly does the substring tier run, and there more than one
//! hit is an error.

use crate::errors::ResolutionError;
use crate::token::{normalize, ChipTypeToken};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Artifact extension without the dot, compared case-insensitively
    pub extension: String,
    /// How many candidate paths an ambiguity error lists
    pub ambiguity_preview_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extension: "ct".to_string(),
            ambiguity_preview_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    ExactStem,
    Substring,
}

/// A file found during the scan
#[derive(Debug, Clone)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    pub stem: String,
    pub normalized_stem: String,
}

impl ArtifactCandidate {
    fn from_path(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        let normalized_stem = normalize(&stem);
        Some(Self {
            path,
            stem,
            normalized_stem,
        })
    }

    fn file_name_len(&self) -> usize {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().chars().count())
            .unwrap_or(0)
    }

    fn matches(&self, token: &ChipTypeToken, tier: MatchTier) -> bool {
        let stem_lower = self.stem.to_lowercase();
        match tier {
            MatchTier::ExactStem => {
                stem_lower == token.lowercase()
                    || (!token.normalized().is_empty()
                        && self.normalized_stem == token.normalized())
            }
            MatchTier::Substring => {
                let lower = token.lowercase();
                (!lower.is_empty() && stem_lower.contains(&lower))
                    || (!token.normalized().is_empty()
                        && self.normalized_stem.contains(token.normalized()))
            }
        }
    }
}

/// The outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub tier: MatchTier,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactResolver {
    config: ResolverConfig,
}

impl ArtifactResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `token` to a single artifact path under `root`.
    pub fn resolve(&self, token: &ChipTypeToken, root: &Path) -> Result<PathBuf, ResolutionError> {
        self.resolve_detailed(token, root).map(|r| r.path)
    }

    #[instrument(level = "debug", skip(self), fields(chip_type = %token))]
    pub fn resolve_detailed(
        &self,
        token: &ChipTypeToken,
        root: &Path,
    ) -> Result<Resolution, ResolutionError> {
        if !root.is_dir() {
            return Err(ResolutionError::NotFound(format!(
                "CT search root not found: {}",
                root.display()
            )));
        }

        let candidates = self.scan(root);
        if candidates.is_empty() {
            return Err(ResolutionError::NotFound(format!(
                "No .{} files found under {}",
                self.config.extension,
                root.display()
            )));
        }
        debug!("scanned {} artifact candidates", candidates.len());

        let mut exact: Vec<&ArtifactCandidate> = candidates
            .iter()
            .filter(|c| c.matches(token, MatchTier::ExactStem))
            .collect();
        if !exact.is_empty() {
            // Shortest file name first, then path order, for a stable pick
            exact.sort_by_cached_key(|c| {
                (c.file_name_len(), c.path.to_string_lossy().to_lowercase())
            });
            if exact.len() > 1 {
                debug!(
                    "{} exact stem matches, picking {}",
                    exact.len(),
                    exact[0].path.display()
                );
            }
            return Ok(Resolution {
                path: exact[0].path.clone(),
                tier: MatchTier::ExactStem,
            });
        }

        let mut contained: Vec<&ArtifactCandidate> = candidates
            .iter()
            .filter(|c| c.matches(token, MatchTier::Substring))
            .collect();

        match contained.len() {
            0 => Err(ResolutionError::NotFound(format!(
                "No .{} file found for chip type '{}' in {}",
                self.config.extension,
                token,
                root.display()
            ))),
            1 => Ok(Resolution {
                path: contained[0].path.clone(),
                tier: MatchTier::Substring,
            }),
            total => {
                contained.sort_by(|a, b| a.path.cmp(&b.path));
                let candidates = contained
                    .iter()
                    .take(self.config.ambiguity_preview_limit)
                    .map(|c| c.path.clone())
                    .collect();
                Err(ResolutionError::Ambiguous {
                    chip_type: token.raw().to_string(),
                    candidates,
                    total,
                })
            }
        }
    }

    fn scan(&self, root: &Path) -> Vec<ArtifactCandidate> {
        let wanted = self.config.extension.to_lowercase();
        WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .filter_map(|e| ArtifactCandidate::from_path(e.into_path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"ct").unwrap();
        path
    }

    #[test]
    fn exact_stem_ignores_case_and_punctuation() {
        let dir = tempfile::tempdir().unwrap();
        let expected = touch(dir.path(), "lot7/XYZ_99.CT");
        touch(dir.path(), "lot7/readme.txt");

        let resolved = ArtifactResolver::default()
            .resolve_detailed(&ChipTypeToken::new("xyz-99"), dir.path())
            .unwrap();
        assert_eq!(resolved.path, expected);
        assert_eq!(resolved.tier, MatchTier::ExactStem);
    }

    #[test]
    fn exact_tier_beats_substring_tier() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ABC123_rev2.ct");
        let exact = touch(dir.path(), "ABC123.ct");

        let resolved = ArtifactResolver::default()
            .resolve(&ChipTypeToken::new("abc123"), dir.path())
            .unwrap();
        assert_eq!(resolved, exact);
    }

    #[test]
    fn single_substring_match_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let only = touch(dir.path(), "deep/er/SQ_ABC123_final.ct");
        touch(dir.path(), "other.ct");

        let resolved = ArtifactResolver::default()
            .resolve_detailed(&ChipTypeToken::new("ABC123"), dir.path())
            .unwrap();
        assert_eq!(resolved.path, only);
        assert_eq!(resolved.tier, MatchTier::Substring);
    }

    #[test]
    fn preview_limit_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(dir.path(), &format!("chip_{i}_abc.ct"));
        }
        let resolver = ArtifactResolver::new(ResolverConfig {
            ambiguity_preview_limit: 2,
            ..ResolverConfig::default()
        });
        match resolver.resolve(&ChipTypeToken::new("abc"), dir.path()) {
            Err(ResolutionError::Ambiguous {
                candidates, total, ..
            }) => {
                assert_eq!(total, 5);
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0] < candidates[1]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactResolver::default()
            .resolve(&ChipTypeToken::new("abc"), &dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound(_)));
    }

    #[test]
    fn empty_token_never_substring_matches() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.ct");
        touch(dir.path(), "b.ct");
        let err = ArtifactResolver::default()
            .resolve(&ChipTypeToken::new("--"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound(_)));
    }
}
