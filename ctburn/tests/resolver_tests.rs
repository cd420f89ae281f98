use ctburn::resolver::MatchTier;
use ctburn::{ArtifactResolver, ChipTypeToken, ResolutionError, ResolverConfig};
use std::fs;
use std::path::Path;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"ct").unwrap();
}

#[test]
fn normalized_stem_match_in_nested_folder() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "2024/batch-a/XYZ_99.CT");
    touch(dir.path(), "2024/batch-a/readme.txt");

    let resolution = ArtifactResolver::default()
        .resolve_detailed(&ChipTypeToken::new("xyz-99"), dir.path())
        .unwrap();
    assert_eq!(resolution.tier, MatchTier::ExactStem);
    assert_eq!(resolution.path, dir.path().join("2024/batch-a/XYZ_99.CT"));
}

#[test]
fn exact_stem_prefers_shorter_file_name() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a/ABC-123.ct");
    touch(dir.path(), "b/ABC123.ct");
    touch(dir.path(), "c/ABC123_rev2.ct");

    let found = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("ABC123"), dir.path())
        .unwrap();
    assert_eq!(found, dir.path().join("b/ABC123.ct"));
}

#[test]
fn equal_length_exact_matches_pick_first_path() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "zeta/ABC123.ct");
    touch(dir.path(), "alpha/ABC123.ct");

    let found = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("abc123"), dir.path())
        .unwrap();
    assert_eq!(found, dir.path().join("alpha/ABC123.ct"));
}

#[test]
fn tokens_without_ascii_alphanumerics_need_a_literal_stem() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "日本.ct");
    touch(dir.path(), "---.ct");

    let err = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("芯片"), dir.path())
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NotFound(_)));

    let found = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("日本"), dir.path())
        .unwrap();
    assert_eq!(found, dir.path().join("日本.ct"));
}

#[test]
fn single_substring_match_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "ABC123_rev2.ct");
    touch(dir.path(), "QQQ.ct");

    let resolution = ArtifactResolver::default()
        .resolve_detailed(&ChipTypeToken::new("abc123"), dir.path())
        .unwrap();
    assert_eq!(resolution.tier, MatchTier::Substring);
    assert_eq!(resolution.path, dir.path().join("ABC123_rev2.ct"));
}

#[test]
fn no_match_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "ABC123.ct");

    let err = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("ZZZ"), dir.path())
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NotFound(_)));
}

#[test]
fn missing_root_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("ABC"), &dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NotFound(_)));
}

#[test]
fn ambiguous_matches_are_sorted_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    for i in (0..12).rev() {
        touch(dir.path(), &format!("CHIP{i:02}X.ct"));
    }

    let err = ArtifactResolver::default()
        .resolve(&ChipTypeToken::new("chip"), dir.path())
        .unwrap_err();
    match err {
        ResolutionError::Ambiguous {
            chip_type,
            candidates,
            total,
        } => {
            assert_eq!(chip_type, "chip");
            assert_eq!(total, 12);
            assert_eq!(candidates.len(), 10);
            assert_eq!(candidates[0], dir.path().join("CHIP00X.ct"));
            assert_eq!(candidates[9], dir.path().join("CHIP09X.ct"));
        }
        other => panic!("expected ambiguity, got {other}"),
    }
}

#[test]
fn preview_limit_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["ABC1.ct", "ABC2.ct", "ABC3.ct"] {
        touch(dir.path(), name);
    }
    let resolver = ArtifactResolver::new(ResolverConfig {
        ambiguity_preview_limit: 2,
        ..ResolverConfig::default()
    });

    let err = resolver
        .resolve(&ChipTypeToken::new("ABC"), dir.path())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("3 candidates found"));
    assert!(message.contains("ABC2.ct"));
    assert!(!message.contains("ABC3.ct"));
}
