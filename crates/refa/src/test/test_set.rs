// Tests for multi-pattern sets
use crate::*;

fn set(anchor: Anchor, patterns: &[&str]) -> RegexSet {
    let mut builder = RegexSetBuilder::new(anchor);
    for (i, pattern) in patterns.iter().enumerate() {
        assert_eq!(builder.add(pattern).unwrap(), i);
    }
    builder.build().unwrap()
}

#[test]
fn test_unanchored() {
    let set = set(Anchor::Unanchored, &["foo", "bar", "baz"]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.matches("afoobaryo"), vec![0, 1]);
    assert_eq!(set.matches("baz and foo"), vec![0, 2]);
    assert!(set.matches("nothing").is_empty());
    assert!(set.is_match("xbazx"));
}

#[test]
fn test_anchor_start() {
    let set = set(Anchor::AnchorStart, &["foo", "bar", "baz"]);
    assert_eq!(set.matches("baro"), vec![1]);
    assert!(set.matches("xbar").is_empty());
}

#[test]
fn test_anchor_both() {
    let set = set(Anchor::AnchorBoth, &["foo", "bar", "baz"]);
    assert!(set.matches("foobar").is_empty());
    assert_eq!(set.matches("bar"), vec![1]);
}

#[test]
fn test_overlapping_patterns() {
    let set = set(Anchor::Unanchored, &["a+", "ab", r"\w+", "z"]);
    assert_eq!(set.matches("aab"), vec![0, 1, 2]);
}

#[test]
fn test_patterns_with_groups() {
    let set = set(Anchor::Unanchored, &["(a)(b)(c)", "(x)"]);
    assert_eq!(set.matches("abc x"), vec![0, 1]);
}

#[test]
fn test_set_options() {
    let options = Options::default().case_insensitive(true);
    let mut builder = RegexSetBuilder::with_options(Anchor::Unanchored, options);
    builder.add("hello").unwrap();
    let set = builder.build().unwrap();
    assert_eq!(set.matches("HELLO"), vec![0]);
}

#[test]
fn test_add_rejects_bad_pattern() {
    let mut builder = RegexSetBuilder::new(Anchor::Unanchored);
    let err = builder.add("a(").unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnbalancedParen));
    assert!(builder.is_empty());
}
