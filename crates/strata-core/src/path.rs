//! Paths addressing locations in a Document Tree.
//!
//! One grammar covers both notations in use:
//! - dotted/bracket, as written in overrides: `network.orgs[2].name`
//! - root-addressed, as written in placeholders: `/network/orgs[2]/name`
//!
//! `.` and `/` are interchangeable separators, a leading `/` is optional and
//! `[n]` suffixes index into sequences.

use std::fmt;

use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map_res, opt},
    multi::{many0, separated_list0},
    sequence::{delimited, preceded},
};
use strata_common::error::{Result, StrataError};

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl Segment {
    /// Creates a key segment.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }
}

/// A location in a tree, as a sequence of segments from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The empty path, addressing the root mapping.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses a path in dotted or root-addressed notation.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidPath`] on unbalanced or non-numeric
    /// brackets.
    pub fn parse(text: &str) -> Result<Self> {
        let (_, groups) = all_consuming(path_text)
            .parse(text)
            .map_err(|_| StrataError::InvalidPath {
                path: text.to_string(),
                message: "expected segments separated by `.` or `/`".into(),
            })?;
        Ok(Self(groups.into_iter().flatten().collect()))
    }

    /// Returns the segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    /// Removes and returns the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    /// Returns a copy with `levels` trailing segments removed, stopping at the root.
    #[must_use]
    pub fn ancestor(&self, levels: usize) -> Self {
        let keep = self.0.len().saturating_sub(levels);
        Self(self.0[..keep].to_vec())
    }

    /// Renders in dotted notation: `a.b[2]`.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Index(index) => out.push_str(&format!("[{index}]")),
            }
        }
        out
    }
}

impl fmt::Display for Path {
    /// Renders in root-addressed notation: `/a/b[2]`, or `/` for the root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => write!(f, "/{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

const fn is_key_char(c: char) -> bool {
    !matches!(c, '/' | '.' | '[' | ']')
}

fn index(input: &str) -> IResult<&str, usize> {
    map_res(delimited(char('['), digit1, char(']')), str::parse::<usize>).parse(input)
}

/// A key followed by any number of `[n]` suffixes; either part may be empty.
fn segment_group(input: &str) -> IResult<&str, Vec<Segment>> {
    (take_while(is_key_char), many0(index))
        .map(|(key, indices): (&str, Vec<usize>)| {
            let mut group = Vec::with_capacity(indices.len() + 1);
            if !key.is_empty() {
                group.push(Segment::Key(key.to_string()));
            }
            group.extend(indices.into_iter().map(Segment::Index));
            group
        })
        .parse(input)
}

fn path_text(input: &str) -> IResult<&str, Vec<Vec<Segment>>> {
    preceded(opt(char('/')), separated_list0(one_of("./"), segment_group)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(path: &Path) -> Vec<String> {
        path.segments()
            .iter()
            .map(|s| match s {
                Segment::Key(k) => k.clone(),
                Segment::Index(i) => format!("#{i}"),
            })
            .collect()
    }

    #[test]
    fn parse_dotted_with_index() {
        let path = Path::parse("network.orgs[2].name").expect("parse");
        assert_eq!(keys(&path), vec!["network", "orgs", "#2", "name"]);
        assert_eq!(path.to_dotted(), "network.orgs[2].name");
        assert_eq!(path.to_string(), "/network/orgs[2]/name");
    }

    #[test]
    fn parse_root_addressed_mixes_separators() {
        let path = Path::parse("/a/b.c").expect("parse");
        assert_eq!(keys(&path), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_bare_index_segment() {
        let path = Path::parse("/list/[0]/x").expect("parse");
        assert_eq!(keys(&path), vec!["list", "#0", "x"]);
    }

    #[test]
    fn parse_skips_empty_segments() {
        let path = Path::parse("/a//b/").expect("parse");
        assert_eq!(keys(&path), vec!["a", "b"]);
        assert!(Path::parse("").expect("parse").is_root());
        assert!(Path::parse("/").expect("parse").is_root());
    }

    #[test]
    fn parse_rejects_bad_brackets() {
        assert!(Path::parse("a[x]").is_err());
        assert!(Path::parse("a[1").is_err());
    }

    #[test]
    fn ancestor_stops_at_root() {
        let path = Path::parse("a.b.c").expect("parse");
        assert_eq!(path.ancestor(1).to_dotted(), "a.b");
        assert!(path.ancestor(5).is_root());
        assert_eq!(Path::root().to_string(), "/");
    }
}
