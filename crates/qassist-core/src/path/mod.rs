//! Dotted, array-indexed field paths (`items[2].unit_price`).
//!
//! A [`FieldPath`] is an explicit list of key and index segments. It is
//! interpreted against `serde_json::Value` trees by [`get`] and [`set`],
//! which never fail on missing data.

mod ops;

pub use ops::{get, leaf_paths, set, set_in_place};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathErrorKind, PathSyntaxError};

/// Largest array index a parsed path may address.
pub const MAX_INDEX: usize = 9_999;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object property.
    Key(String),
    /// Array position.
    Index(usize),
}

/// A non-empty address into a nested record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Parse a path string such as `customer.name` or `items[0].sku`.
    pub fn parse(input: &str) -> Result<Self, PathSyntaxError> {
        Parser::new(input).run()
    }

    /// Build a path from segments. Returns `None` when `segments` is empty.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    /// Start a path with a single key.
    pub fn root(key: impl Into<String>) -> Self {
        Self(vec![Segment::Key(key.into())])
    }

    /// Append a key segment.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::Key(key.into()));
        self
    }

    /// Append an index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// The path without its last segment, if any remains.
    pub fn parent(&self) -> Option<Self> {
        Self::from_segments(self.0[..self.0.len() - 1].to_vec())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathSyntaxError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathSyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

const KEY_TERMINATORS: &[char] = &['.', '[', ']'];

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    segments: Vec<Segment>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn run(mut self) -> Result<FieldPath, PathSyntaxError> {
        if self.input.is_empty() {
            return Err(self.error(0, "", PathErrorKind::Empty));
        }

        let mut after_dot = false;
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if after_dot && (rest.starts_with('.') || rest.starts_with('[')) {
                return Err(self.error(self.pos, &rest[..1], PathErrorKind::EmptySegment));
            }
            after_dot = false;

            if rest.starts_with('[') {
                self.index(rest)?;
            } else if rest.starts_with(']') {
                return Err(self.error(self.pos, "]", PathErrorKind::UnopenedBracket));
            } else if rest.starts_with('.') {
                return Err(self.error(self.pos, ".", PathErrorKind::EmptySegment));
            } else {
                let end = rest.find(KEY_TERMINATORS).unwrap_or(rest.len());
                self.segments.push(Segment::Key(rest[..end].to_string()));
                self.pos += end;
            }

            let rest = &self.input[self.pos..];
            if rest.starts_with('.') {
                self.pos += 1;
                if self.pos == self.input.len() {
                    return Err(self.error(self.pos - 1, ".", PathErrorKind::TrailingDot));
                }
                after_dot = true;
            }
        }

        Ok(FieldPath(self.segments))
    }

    /// Consume `[n]` at the start of `rest`.
    fn index(&mut self, rest: &str) -> Result<(), PathSyntaxError> {
        let Some(close) = rest.find(']') else {
            return Err(self.error(self.pos, rest, PathErrorKind::UnclosedBracket));
        };
        let content = &rest[1..close];
        if content.contains('[') {
            return Err(self.error(self.pos, &rest[..=close], PathErrorKind::UnclosedBracket));
        }
        if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(self.pos, &rest[..=close], PathErrorKind::InvalidIndex));
        }
        let index = match content.parse::<usize>() {
            Ok(index) if index <= MAX_INDEX => index,
            _ => {
                return Err(self.error(self.pos, &rest[..=close], PathErrorKind::IndexTooLarge));
            }
        };

        self.segments.push(Segment::Index(index));
        self.pos += close + 1;

        let after = &self.input[self.pos..];
        if !(after.is_empty() || after.starts_with('.') || after.starts_with('[')) {
            let mut end = after.find(KEY_TERMINATORS).unwrap_or(after.len());
            if end == 0 {
                end = after.chars().next().map_or(0, char::len_utf8);
            }
            return Err(self.error(self.pos, &after[..end], PathErrorKind::UnexpectedCharacter));
        }
        Ok(())
    }

    fn error(&self, position: usize, segment: &str, kind: PathErrorKind) -> PathSyntaxError {
        PathSyntaxError {
            path: self.input.to_string(),
            position,
            segment: segment.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(input: &str) -> PathErrorKind {
        FieldPath::parse(input).unwrap_err().kind
    }

    #[test]
    fn test_parse_keys_and_indexes() {
        let path = FieldPath::parse("items[2].unit_price").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("items".to_string()),
                Segment::Index(2),
                Segment::Key("unit_price".to_string()),
            ]
        );
        assert_eq!(path, FieldPath::root("items").index(2).key("unit_price"));
    }

    #[test]
    fn test_parse_nested_indexes() {
        let path = FieldPath::parse("matrix[1][0]").unwrap();
        assert_eq!(path, FieldPath::root("matrix").index(1).index(0));

        let leading = FieldPath::parse("[3].name").unwrap();
        assert_eq!(
            leading.segments(),
            &[Segment::Index(3), Segment::Key("name".to_string())]
        );
    }

    #[test]
    fn test_display_round_trip() {
        for input in ["customer.name", "items[0].sku", "a[1][2].b.c", "[0]", "x"] {
            let path = FieldPath::parse(input).unwrap();
            assert_eq!(path.to_string(), input);
            assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(kind_of(""), PathErrorKind::Empty);
        assert_eq!(kind_of("customer."), PathErrorKind::TrailingDot);
        assert_eq!(kind_of(".customer"), PathErrorKind::EmptySegment);
        assert_eq!(kind_of("customer..name"), PathErrorKind::EmptySegment);
        assert_eq!(kind_of("items.[0]"), PathErrorKind::EmptySegment);
        assert_eq!(kind_of("items[0"), PathErrorKind::UnclosedBracket);
        assert_eq!(kind_of("items[0[1]]"), PathErrorKind::UnclosedBracket);
        assert_eq!(kind_of("items0]"), PathErrorKind::UnopenedBracket);
        assert_eq!(kind_of("items[x]"), PathErrorKind::InvalidIndex);
        assert_eq!(kind_of("items[]"), PathErrorKind::InvalidIndex);
        assert_eq!(kind_of("items[-1]"), PathErrorKind::InvalidIndex);
        assert_eq!(kind_of("items[10000]"), PathErrorKind::IndexTooLarge);
        assert_eq!(kind_of("items[18446744073709551615]"), PathErrorKind::IndexTooLarge);
        assert_eq!(kind_of("items[99999999999999999999999]"), PathErrorKind::IndexTooLarge);
        assert_eq!(kind_of("items[0]sku"), PathErrorKind::UnexpectedCharacter);
    }

    #[test]
    fn test_error_reports_segment() {
        let err = FieldPath::parse("items[two].sku").unwrap_err();
        assert_eq!(err.position, 5);
        assert_eq!(err.segment, "[two]");
        assert!(err.to_string().contains("items[two].sku"));
    }

    #[test]
    fn test_parent() {
        let path = FieldPath::parse("items[0].sku").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "items[0]");
        assert_eq!(parent.parent().unwrap().to_string(), "items");
        assert!(FieldPath::root("items").parent().is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let path = FieldPath::parse("items[1].qty").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"items[1].qty\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<FieldPath>("\"items[\"").is_err());
    }
}
