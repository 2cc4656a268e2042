//! Path expressions addressing nodes inside a record
//!
//! A path is a dot separated list of segments. Segments made only of ASCII
//! digits address array elements, every other segment addresses an object
//! field. A backslash escapes the next character, so `a\.b` names the single
//! field `a.b`.

use crate::error::{CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object field by name
    Field(String),
    /// Array element by position
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => {
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                    write!(f, "\\")?;
                }
                for c in name.chars() {
                    if c == '.' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                Ok(())
            }
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Parsed path expression
///
/// The empty path addresses the record root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Path addressing the record root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot separated path expression
    pub fn parse(expr: &str) -> CodecResult<Self> {
        if expr.is_empty() {
            return Ok(Self::root());
        }

        let invalid = |reason: &str| CodecError::InvalidPath {
            path: expr.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut escaped = false;
        let mut chars = expr.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let next = chars.next().ok_or_else(|| invalid("dangling escape"))?;
                    escaped = true;
                    current.push(next);
                }
                '.' => {
                    if current.is_empty() {
                        return Err(invalid("empty segment"));
                    }
                    segments.push(Self::segment(std::mem::take(&mut current), escaped));
                    escaped = false;
                }
                _ => current.push(c),
            }
        }

        if current.is_empty() {
            return Err(invalid("empty segment"));
        }
        segments.push(Self::segment(current, escaped));

        Ok(Self { segments })
    }

    // An escape anywhere in the segment forces a field, so `\0` names field "0".
    fn segment(raw: String, escaped: bool) -> Segment {
        if !escaped && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<usize>() {
                return Segment::Index(index);
            }
        }
        Segment::Field(raw)
    }

    /// Append a field segment
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Field(name.into()));
        self
    }

    /// Append an index segment
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for Path {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
