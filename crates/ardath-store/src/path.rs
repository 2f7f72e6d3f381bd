//! Slash-separated locations in the realtime tree.

use crate::error::{Result, StoreError};

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// A normalized database path. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `a/b/c`. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment(raw, segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn child(&self, segment: &str) -> Result<Self> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Last segment, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `true` when `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &DbPath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// `true` when one path is an ancestor of (or equal to) the other.
    pub fn overlaps(&self, other: &DbPath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl std::fmt::Display for DbPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: "empty segment".to_string(),
        });
    }
    if let Some(c) = segment.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: format!("forbidden character `{c}`"),
        });
    }
    Ok(())
}
