//! # Value Paths
//!
//! Locations inside a value (or schema) tree, used to qualify violations and
//! schema definition errors. Rendered as `key.sub[2].leaf`; the root renders
//! as `(root)`.

use std::fmt;

/// One step in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence position.
    Index(usize),
    /// Every element of a homogeneous list (schema paths only).
    Each,
}

/// A location inside a value or schema tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Path of a child under mapping key `key`.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Path of the child at sequence position `index`.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Path of the element spec of a list.
    pub fn each(&self) -> Self {
        self.child(PathSegment::Each)
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
                PathSegment::Each => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    /// Builds a path of mapping keys.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(|k| PathSegment::Key(k.into())).collect(),
        }
    }
}
