use super::*;
use crate::kernel::services::adapters::search::scan_text;
use crate::models::OpenDocuments;
use regex::Regex;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(10);

fn find(path: &Path, content: &str, pattern: &str) -> Vec<MatchRecord> {
    let regex = Regex::new(pattern).unwrap();
    scan_text(path, content, &regex, &CancelToken::new())
}

fn collect_until_finished(rx: &Receiver<ReplaceMessage>) -> Vec<ReplaceMessage> {
    let mut messages = Vec::new();
    loop {
        let msg = rx.recv_timeout(TIMEOUT).expect("replace did not finish in time");
        let done = matches!(msg, ReplaceMessage::Finished { .. });
        messages.push(msg);
        if done {
            return messages;
        }
    }
}

fn finished_count(messages: &[ReplaceMessage]) -> (usize, bool) {
    match messages.last() {
        Some(ReplaceMessage::Finished {
            replacements,
            cancelled,
            ..
        }) => (*replacements, *cancelled),
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[test]
fn test_apply_replacements_back_to_front() {
    let content = "aaa";
    let mut matches = find(Path::new("x"), content, "a");
    // 只替换第 1 和第 3 个
    matches.remove(1);
    assert_eq!(apply_replacements(content, &matches, "Z").unwrap(), "ZaZ");
}

#[test]
fn test_apply_replacements_with_groups() {
    let content = "let x = 1;\nlet yy = 22;";
    let matches = find(Path::new("x"), content, r"let (\w+) = (\d+)");
    assert_eq!(
        apply_replacements(content, &matches, "const $1: i32 = $2").unwrap(),
        "const x: i32 = 1;\nconst yy: i32 = 22;"
    );
}

#[test]
fn test_apply_replacements_length_changes() {
    let content = "ab ab ab";
    let matches = find(Path::new("x"), content, "ab");
    assert_eq!(
        apply_replacements(content, &matches, "longer").unwrap(),
        "longer longer longer"
    );
    assert_eq!(apply_replacements(content, &matches, "").unwrap(), "  ");
}

#[test]
fn test_stale_content_is_rejected() {
    let matches = find(Path::new("x"), "one two", "two");
    assert_eq!(apply_replacements("one TWO", &matches, "2"), Err(4));
    assert_eq!(apply_replacements("one", &matches, "2"), Err(4));
}

#[test]
fn test_overlapping_matches_rejected() {
    let content = "abcd";
    let mut first = find(Path::new("x"), content, "abc");
    let second = find(Path::new("x"), content, "bcd");
    first.extend(second);
    assert_eq!(apply_replacements(content, &first, "_"), Err(1));
}

#[test]
fn test_replace_in_file_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "foo bar foo").unwrap();

    let matches = find(&path, "foo bar foo", "foo");
    replace_in_file(&path, &matches, "baz").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "baz bar baz");
}

#[test]
fn test_replace_in_file_decode_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    std::fs::write(&path, b"caf\xe9 foo").unwrap();

    let text = String::from_utf8_lossy(b"caf\xe9 foo").into_owned();
    let matches = find(&path, &text, "foo");
    let err = replace_in_file(&path, &matches, "bar").unwrap_err();
    assert!(matches!(err, ReplaceError::Decode { .. }));
    assert_eq!(err.path(), path.as_path());
    assert_eq!(std::fs::read(&path).unwrap(), b"caf\xe9 foo");
}

#[test]
fn test_replace_in_file_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    let matches = find(&path, "foo", "foo");
    assert!(matches!(
        replace_in_file(&path, &matches, "bar"),
        Err(ReplaceError::Read { .. })
    ));
}

#[test]
fn test_coordinator_replaces_disk_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    std::fs::write(&a, "x1 x2").unwrap();
    std::fs::write(&b, "x3").unwrap();

    let mut batch = ReplaceBatch::new();
    for m in find(&a, "x1 x2", r"x(\d)") {
        batch.insert(m);
    }
    for m in find(&b, "x3", r"x(\d)") {
        batch.insert(m);
    }

    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    coordinator
        .replace(batch, "y$1", &mut OpenDocuments::new())
        .unwrap();
    let messages = collect_until_finished(&rx);
    coordinator.wait();

    assert_eq!(std::fs::read_to_string(&a).unwrap(), "y1 y2");
    assert_eq!(std::fs::read_to_string(&b).unwrap(), "y3");
    let applied = messages
        .iter()
        .filter(|m| matches!(m, ReplaceMessage::Applied { .. }))
        .count();
    assert_eq!(applied, 2);
    assert_eq!(finished_count(&messages), (3, false));
    assert_eq!(
        messages.last().unwrap().summary().as_deref(),
        Some("3 replacements in 0 second(s)")
    );
}

#[test]
fn test_coordinator_edits_open_documents_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("open.txt");
    std::fs::write(&path, "on disk foo").unwrap();

    let mut docs = OpenDocuments::new();
    docs.open(path.clone(), "buffer foo foo");
    let batch = ReplaceBatch::from_records(find(&path, "buffer foo foo", "foo"));

    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    coordinator.replace(batch, "bar", &mut docs).unwrap();

    // 已打开文档在 replace 返回前已经修改
    assert_eq!(docs.get(&path).unwrap().buffer.text(), "buffer bar bar");
    assert!(docs.is_dirty(&path));

    let messages = collect_until_finished(&rx);
    assert_eq!(finished_count(&messages), (2, false));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "on disk foo");
}

#[test]
fn test_failed_file_does_not_stop_others() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("a_bad.txt");
    let good = dir.path().join("b_good.txt");
    std::fs::write(&bad, b"\xff\xfe foo").unwrap();
    std::fs::write(&good, "foo").unwrap();

    let bad_text = String::from_utf8_lossy(b"\xff\xfe foo").into_owned();
    let mut records = find(&bad, &bad_text, "foo");
    records.extend(find(&good, "foo", "foo"));

    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    coordinator
        .replace(
            ReplaceBatch::from_records(records),
            "bar",
            &mut OpenDocuments::new(),
        )
        .unwrap();
    let messages = collect_until_finished(&rx);

    let errors: Vec<&PathBuf> = messages
        .iter()
        .filter_map(|m| match m {
            ReplaceMessage::Error { path, .. } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![&bad]);
    assert_eq!(std::fs::read_to_string(&good).unwrap(), "bar");
    assert_eq!(finished_count(&messages), (1, false));
}

#[test]
fn test_stale_open_document_reports_error() {
    let path = PathBuf::from("/virtual/doc.txt");
    let records = find(&path, "old text", "old");

    let mut docs = OpenDocuments::new();
    docs.open(path.clone(), "new text");

    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    coordinator
        .replace(ReplaceBatch::from_records(records), "x", &mut docs)
        .unwrap();
    let messages = collect_until_finished(&rx);

    assert!(matches!(messages[0], ReplaceMessage::Error { .. }));
    assert_eq!(docs.get(&path).unwrap().buffer.text(), "new text");
    assert_eq!(finished_count(&messages), (0, false));
}

#[test]
fn test_empty_batch_still_finishes() {
    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    let id = coordinator
        .replace(ReplaceBatch::new(), "x", &mut OpenDocuments::new())
        .unwrap();
    let messages = collect_until_finished(&rx);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].replace_id(), id);
    assert_eq!(finished_count(&messages), (0, false));
}
