use super::*;
use crate::kernel::services::ports::search::TextPosition;
use std::path::PathBuf;
use tempfile::tempdir;

fn scan(content: &str, pattern: &str) -> Vec<MatchRecord> {
    let regex = Regex::new(pattern).unwrap();
    scan_text(Path::new("mem.txt"), content, &regex, &CancelToken::new())
}

#[test]
fn test_positions_of_repeated_word() {
    let matches = scan("abc\ndef\nabc", "abc");
    assert_eq!(matches.len(), 2);
    assert_eq!((matches[0].line, matches[0].col), (1, 0));
    assert_eq!((matches[1].line, matches[1].col), (3, 0));
    assert_eq!(matches[1].start, 8);
    assert_eq!(matches[1].end, 11);
    assert_eq!(matches[1].line_text, "abc");
    assert_eq!(matches[1].matched_text(), "abc");
}

#[test]
fn test_match_after_leading_newline() {
    let matches = scan("\nabc", "abc");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].position(), TextPosition::new(2, 0));
    assert_eq!(matches[0].line_text, "abc");
}

#[test]
fn test_line_text_strips_carriage_return() {
    let matches = scan("first\r\nsecond line\r\n", "line");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].line, 2);
    assert_eq!(matches[0].col, 7);
    assert_eq!(matches[0].line_text, "second line");
}

#[test]
fn test_groups_and_names() {
    let matches = scan("key=value\nother", r"(?P<k>\w+)=(\w+)?");
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(
        m.groups,
        vec![
            Some("key=value".to_string()),
            Some("key".to_string()),
            Some("value".to_string())
        ]
    );
    assert_eq!(m.group_names.len(), 3);
    assert_eq!(m.group_names[1].as_deref(), Some("k"));
    assert_eq!(m.group_names[2], None);
}

#[test]
fn test_non_participating_group_is_none() {
    let matches = scan("ab", r"a(x)?b");
    assert_eq!(matches[0].groups, vec![Some("ab".to_string()), None]);
}

#[test]
fn test_multibyte_columns() {
    let matches = scan("ünïcödé target", "target");
    assert_eq!(matches[0].col, 8);
    assert_eq!(matches[0].start, "ünïcödé ".len());
}

#[test]
fn test_cancel_stops_after_current_match() {
    let regex = Regex::new("a").unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let matches = scan_text(Path::new("mem.txt"), "aaaa", &regex, &cancel);
    assert_eq!(matches.len(), 1);
}

#[test]
fn test_binary_detection() {
    assert!(is_likely_binary(b"abc\0def"));
    assert!(!is_likely_binary(b"plain text"));

    let mut late_nul = vec![b'a'; BINARY_PROBE_LEN];
    late_nul.push(0);
    assert!(!is_likely_binary(&late_nul));
}

#[test]
fn test_load_content_skips_binary_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    std::fs::write(&path, b"needle\0\x01\x02").unwrap();

    let snapshot = DocumentSnapshot::new();
    let content = load_content(&path, &snapshot).unwrap();
    assert!(matches!(content, FileContent::Binary));
}

#[test]
fn test_load_content_lossy_decode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    std::fs::write(&path, b"caf\xe9 needle").unwrap();

    let snapshot = DocumentSnapshot::new();
    let FileContent::Text(text) = load_content(&path, &snapshot).unwrap() else {
        panic!("expected text");
    };
    assert!(text.contains('\u{FFFD}'));
    assert!(text.ends_with("needle"));
}

#[test]
fn test_snapshot_takes_precedence_over_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("open.txt");
    std::fs::write(&path, "on disk").unwrap();

    let mut snapshot = DocumentSnapshot::new();
    snapshot.insert(path.clone(), "unsaved edit".to_string());

    let FileContent::Text(text) = load_content(&path, &snapshot).unwrap() else {
        panic!("expected text");
    };
    assert_eq!(text, "unsaved edit");
}

#[test]
fn test_snapshot_entry_needs_no_file() {
    let path = PathBuf::from("/definitely/not/on/disk.txt");
    let mut snapshot = DocumentSnapshot::new();
    snapshot.insert(path.clone(), "text".to_string());
    assert!(matches!(
        load_content(&path, &snapshot).unwrap(),
        FileContent::Text(_)
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    let snapshot = DocumentSnapshot::new();
    assert!(load_content(&path, &snapshot).is_err());
}

#[test]
fn test_large_binary_file_detected_from_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let mut bytes = b"\0header".to_vec();
    bytes.extend(std::iter::repeat(b'x').take(BINARY_PROBE_LEN * 16));
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        load_content(&path, &DocumentSnapshot::new()).unwrap(),
        FileContent::Binary
    ));
}

#[test]
fn test_text_longer_than_prefix_is_read_fully() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.txt");
    let mut text = "a".repeat(BINARY_PROBE_LEN * 2 + 17);
    text.push_str("needle");
    std::fs::write(&path, &text).unwrap();

    let snapshot = DocumentSnapshot::new();
    let FileContent::Text(loaded) = load_content(&path, &snapshot).unwrap() else {
        panic!("expected text");
    };
    assert_eq!(loaded.len(), text.len());
    assert!(loaded.ends_with("needle"));
}
