use super::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn record(path: &str, start: usize, text: &str) -> MatchRecord {
    MatchRecord {
        path: PathBuf::from(path),
        start,
        end: start + text.len(),
        groups: vec![Some(text.to_string())],
        group_names: Arc::from(vec![None]),
        line: 1,
        col: start,
        line_text: text.to_string(),
    }
}

fn file(path: &str, starts: &[usize]) -> FileResults {
    FileResults {
        root: None,
        path: PathBuf::from(path),
        matches: starts.iter().map(|&s| record(path, s, "foo")).collect(),
    }
}

fn seeded_model(search_id: u64) -> SearchResultsModel {
    let mut model = SearchResultsModel::default();
    model.begin_search(search_id);
    model.apply_message(SearchMessage::Results {
        search_id,
        results: vec![file("a.rs", &[0, 10, 20]), file("b.rs", &[5])],
    });
    model
}

#[test]
fn test_results_accumulate() {
    let model = seeded_model(1);
    assert_eq!(model.files.len(), 2);
    assert_eq!(model.total_matches, 4);
    assert_eq!(model.checked_count(), 4);
    assert!(model.file(Path::new("b.rs")).is_some());
}

#[test]
fn test_stale_messages_are_ignored() {
    let mut model = seeded_model(2);
    let changed = model.apply_message(SearchMessage::Results {
        search_id: 1,
        results: vec![file("old.rs", &[0])],
    });
    assert!(!changed);
    assert_eq!(model.files.len(), 2);

    let mut idle = SearchResultsModel::default();
    assert!(!idle.apply_message(SearchMessage::Progress {
        search_id: 1,
        current: None,
        total: 0,
    }));
}

#[test]
fn test_progress_and_finish() {
    let mut model = SearchResultsModel::default();
    model.begin_search(7);
    assert!(model.is_searching());
    assert_eq!(model.state, SearchState::Enumerating);

    model.apply_message(SearchMessage::Progress {
        search_id: 7,
        current: Some(0),
        total: 3,
    });
    assert_eq!(model.state, SearchState::Scanning);
    assert_eq!(model.progress, Some((0, 3)));

    model.apply_message(SearchMessage::Finished {
        search_id: 7,
        state: SearchState::Completed,
        files_searched: 3,
        total_matches: 0,
    });
    assert!(!model.is_searching());
    assert_eq!(model.status.as_deref(), Some("0 matches in 3 files searched"));
}

#[test]
fn test_begin_search_clears_previous_results() {
    let mut model = seeded_model(1);
    model.begin_search(2);
    assert!(model.files.is_empty());
    assert_eq!(model.total_matches, 0);
    assert_eq!(model.progress, None);
}

#[test]
fn test_replace_batch_uses_checked_matches() {
    let mut model = seeded_model(1);
    assert!(model.set_match_checked(0, 1, false));
    assert!(!model.set_match_checked(0, 1, false));
    assert!(model.set_file_checked(1, false));
    assert!(!model.set_match_checked(9, 0, true));

    let batch = model.replace_batch();
    assert_eq!(batch.file_count(), 1);
    assert_eq!(batch.match_count(), 2);
    let starts: Vec<usize> = batch
        .matches_for(Path::new("a.rs"))
        .unwrap()
        .iter()
        .map(|m| m.start)
        .collect();
    assert_eq!(starts, vec![0, 20]);
}

#[test]
fn test_applied_matches_are_removed() {
    let mut model = seeded_model(1);
    model.begin_replace(9);
    let applied = vec![record("a.rs", 0, "foo"), record("a.rs", 20, "foo")];
    assert!(model.apply_replace_message(ReplaceMessage::Applied {
        replace_id: 9,
        path: PathBuf::from("a.rs"),
        matches: applied,
    }));
    assert_eq!(model.file(Path::new("a.rs")).unwrap().results.matches.len(), 1);
    assert_eq!(model.total_matches, 2);

    model.apply_replace_message(ReplaceMessage::Applied {
        replace_id: 9,
        path: PathBuf::from("b.rs"),
        matches: vec![record("b.rs", 5, "foo")],
    });
    assert!(model.file(Path::new("b.rs")).is_none());
    assert_eq!(model.files.len(), 1);
}

#[test]
fn test_replace_finished_sets_status() {
    let mut model = seeded_model(1);
    model.begin_replace(3);
    model.apply_replace_message(ReplaceMessage::Error {
        replace_id: 3,
        path: PathBuf::from("a.rs"),
        message: "boom".to_string(),
    });
    model.apply_replace_message(ReplaceMessage::Finished {
        replace_id: 3,
        replacements: 4,
        elapsed: Duration::from_millis(1500),
        cancelled: false,
    });
    assert_eq!(model.errors, vec!["boom".to_string()]);
    assert_eq!(model.status.as_deref(), Some("4 replacements in 1 second(s)"));
}

#[test]
fn test_stale_replace_messages_are_ignored() {
    let mut model = seeded_model(1);
    let applied = ReplaceMessage::Applied {
        replace_id: 4,
        path: PathBuf::from("b.rs"),
        matches: vec![record("b.rs", 5, "foo")],
    };
    assert!(!model.apply_replace_message(applied.clone()));

    model.begin_replace(5);
    assert!(!model.apply_replace_message(applied));
    assert!(!model.apply_replace_message(ReplaceMessage::Finished {
        replace_id: 4,
        replacements: 1,
        elapsed: Duration::ZERO,
        cancelled: false,
    }));
    assert_eq!(model.files.len(), 2);
    assert_eq!(model.total_matches, 4);
    assert_eq!(model.status, None);
}
