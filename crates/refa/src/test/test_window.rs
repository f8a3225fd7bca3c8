// Tests for search windows and offset clamping
use crate::*;

#[test]
fn test_clamping_out_of_range() {
    let re = Regex::new("b").unwrap();
    let m = re.search_at("abc", -5, 10000).unwrap();
    assert_eq!(m.span(), Span::new(1, 2));
    assert_eq!((m.pos(), m.endpos()), (0, 3));
}

#[test]
fn test_clamping_end_before_start() {
    let re = Regex::new("").unwrap();
    let m = re.search_at("abc", 2, 1).unwrap();
    assert_eq!(m.span(), Span::new(2, 2));
    assert_eq!((m.pos(), m.endpos()), (2, 2));
}

#[test]
fn test_window_limits_search() {
    let re = Regex::new("c").unwrap();
    assert!(re.search_at("abc", 0, 2).is_none());
    assert_eq!(re.search_at("abcabc", 3, 6).unwrap().span(), Span::new(5, 6));
}

#[test]
fn test_offsets_relative_to_full_buffer() {
    let re = Regex::new("(o)").unwrap();
    let caps = re.captures_at("foo foo", 4, 7).unwrap();
    assert_eq!(caps.span(1usize).unwrap(), Some(Span::new(5, 6)));
    assert_eq!((caps.pos(), caps.endpos()), (4, 7));
}

#[test]
fn test_anchors_see_full_buffer() {
    let re = Regex::new("^b").unwrap();
    assert!(re.search_at("ab", 1, 2).is_none());
    let re = Regex::new("a$").unwrap();
    assert!(re.search_at("ab", 0, 1).is_none());
    let re = Regex::new(r"\bb").unwrap();
    assert!(re.search_at("ab", 1, 2).is_none());
    assert!(re.search_at("a b", 2, 3).is_some());
}

#[test]
fn test_prefix_and_full_in_window() {
    let re = Regex::new("bc").unwrap();
    assert!(re.match_prefix_at("abcd", 1, 4).is_some());
    assert!(re.match_prefix_at("abcd", 0, 4).is_none());
    assert!(re.full_match_at("abcd", 1, 3).is_some());
    assert!(re.full_match_at("abcd", 1, 4).is_none());
}

#[test]
fn test_boolean_tests_in_window() {
    let re = Regex::new("bc").unwrap();
    let hay = "abcd";
    for (start, end) in [(0, 4), (1, 4), (1, 3), (2, 4), (-3, 99), (3, 1)] {
        assert_eq!(
            re.test_search_at(hay, start, end),
            re.search_at(hay, start, end).is_some(),
            "search {start}..{end}"
        );
        assert_eq!(
            re.test_match_at(hay, start, end),
            re.match_prefix_at(hay, start, end).is_some(),
            "match {start}..{end}"
        );
        assert_eq!(
            re.test_full_match_at(hay, start, end),
            re.full_match_at(hay, start, end).is_some(),
            "full match {start}..{end}"
        );
    }
    assert!(!re.test_search_at(hay, 0, 2));
    assert!(re.test_match_at(hay, 1, 4));
    assert!(re.test_full_match_at(hay, 1, 3));
    assert!(!re.test_full_match_at(hay, 1, 4));
}

#[test]
fn test_boolean_tests_see_full_buffer() {
    let re = Regex::new(r"^b").unwrap();
    assert!(!re.test_search_at("abc", 1, 3));
    assert!(re.test_search_at("b c", 0, 1));
    let re = Regex::new("").unwrap();
    assert!(re.test_full_match_at("abc", 2, 1));
}

#[test]
fn test_explicit_window() {
    let re = Regex::new("a+").unwrap();
    let hay = "baaab";
    let window = SearchWindow::new(2, 4, hay.len()).unwrap();
    assert_eq!(
        re.search_window(hay, window).unwrap().unwrap().span(),
        Span::new(2, 4)
    );
    assert!(re.match_prefix_window(hay, window).unwrap().is_some());
    assert!(re.full_match_window(hay, window).unwrap().is_some());

    assert_eq!(
        SearchWindow::new(4, 2, hay.len()),
        Err(Error::InvalidWindow {
            start: 4,
            end: 2,
            len: 5
        })
    );
}

#[test]
fn test_window_splits_utf8_char() {
    let re = Regex::new("é").unwrap();
    let hay = "é";
    // the window ends inside the two-byte encoding
    assert!(re.search_at(hay, 0, 1).is_none());
    assert!(re.search_at(hay, 0, 2).is_some());
}
