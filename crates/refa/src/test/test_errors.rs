// Tests for rejected patterns
use crate::*;

fn parse_err(pattern: &str) -> ParseError {
    match Regex::new(pattern) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected parse error for {pattern:?}, got {other:?}"),
    }
}

#[test]
fn test_unbalanced_paren() {
    let e = parse_err("(");
    assert_eq!(e.kind, ParseErrorKind::UnbalancedParen);
    assert_eq!(e.offset, 1);

    let e = parse_err("a)");
    assert_eq!(e.kind, ParseErrorKind::UnbalancedParen);
    assert_eq!(e.offset, 1);
}

#[test]
fn test_dangling_operator() {
    for pattern in ["*", "+a", "?", "a|*", "(*)", "a(?i)*", "a*(?s)+", "(?i)?"] {
        assert_eq!(
            parse_err(pattern).kind,
            ParseErrorKind::DanglingOperator,
            "{pattern:?}"
        );
    }
    assert_eq!(parse_err("ab|+").offset, 3);
    assert_eq!(parse_err("a(?i)*").offset, 5);
}

#[test]
fn test_invalid_repeat() {
    assert_eq!(parse_err("a**").kind, ParseErrorKind::InvalidRepeat);
    assert_eq!(parse_err("a{3,2}").kind, ParseErrorKind::InvalidRepeat);
    assert_eq!(parse_err("a{1001}").kind, ParseErrorKind::InvalidRepeat);
}

#[test]
fn test_invalid_escape() {
    assert_eq!(parse_err(r"\").kind, ParseErrorKind::InvalidEscape);
    assert_eq!(parse_err(r"\1").kind, ParseErrorKind::InvalidEscape);
    assert_eq!(parse_err(r"\xZZ").kind, ParseErrorKind::InvalidEscape);
    assert_eq!(parse_err(r"\q").kind, ParseErrorKind::InvalidEscape);
}

#[test]
fn test_invalid_class() {
    assert_eq!(parse_err("[a").kind, ParseErrorKind::InvalidClass);
    assert_eq!(parse_err("[z-a]").kind, ParseErrorKind::InvalidClass);
}

#[test]
fn test_group_name_errors() {
    assert_eq!(
        parse_err("(?P<n>a)(?P<n>b)").kind,
        ParseErrorKind::DuplicateGroupName
    );
    assert_eq!(parse_err("(?P<1x>a)").kind, ParseErrorKind::InvalidGroupName);
    assert_eq!(parse_err("(?P<>a)").kind, ParseErrorKind::InvalidGroupName);
}

#[test]
fn test_invalid_flag() {
    assert_eq!(parse_err("(?<=a)b").kind, ParseErrorKind::InvalidFlag);
    assert_eq!(parse_err("(?z)").kind, ParseErrorKind::InvalidFlag);
}

#[test]
fn test_too_complex() {
    let depth = 1001;
    let pattern = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse_err(&pattern).kind, ParseErrorKind::TooComplex);

    let options = Options::default().max_nesting_depth(3);
    assert!(Regex::with_options("(((a)))", options.clone()).is_ok());
    let err = Regex::with_options("((((a))))", options).unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::TooComplex));
}

#[test]
fn test_program_too_large() {
    let options = Options::default().max_program_size(64);
    let err = Regex::with_options("a{1000}", options).unwrap_err();
    match err {
        Error::Compile(e) => assert_eq!(e.kind(), CompileErrorKind::ProgramTooLarge),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_error_display() {
    let e = parse_err("*");
    assert_eq!(e.to_string(), "no argument for repetition operator: * (at offset 0)");
    let err = Regex::new("(").unwrap_err();
    assert!(err.to_string().starts_with("unbalanced parenthesis"));
}
