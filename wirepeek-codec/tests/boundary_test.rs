use std::collections::HashSet;

use assert_matches::assert_matches;
use wirepeek_codec::*;

#[test]
fn generated_boundary_shape() {
    let boundary = Boundary::generate();
    let value = boundary.as_str();
    assert_eq!(BOUNDARY_PREFIX.len(), 27);
    assert!(BOUNDARY_PREFIX.chars().all(|ch| ch == '-'));
    assert!(value.starts_with(BOUNDARY_PREFIX));
    let token = &value[BOUNDARY_PREFIX.len()..];
    assert_eq!(token.len(), 10);
    assert!(token.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn generated_boundaries_are_unique() {
    let seen: HashSet<Boundary> = (0..500).map(|_| Boundary::generate()).collect();
    assert_eq!(seen.len(), 500);
}

#[test]
fn generated_boundary_is_valid() {
    let boundary = Boundary::generate();
    assert_eq!(Boundary::new(boundary.as_str()).unwrap(), boundary);
}

#[test]
fn custom_boundary_delimiter() {
    let boundary = Boundary::new("B").unwrap();
    assert_eq!(boundary.delimiter(), "--B");
    assert_eq!(boundary.to_string(), "B");
}

#[test]
fn rejects_empty_boundary() {
    assert_matches!(Boundary::new(""), Err(CodecError::Boundary(_)));
}

#[test]
fn rejects_long_boundary() {
    assert_matches!(Boundary::new("x".repeat(71)), Err(CodecError::Boundary(_)));
}

#[test]
fn rejects_illegal_characters() {
    assert_matches!(Boundary::new("a\"b"), Err(CodecError::Boundary(_)));
    assert_matches!(Boundary::new("a\r\nb"), Err(CodecError::Boundary(_)));
}

#[test]
fn rejects_trailing_space() {
    assert_matches!(Boundary::new("abc "), Err(CodecError::Boundary(_)));
}
