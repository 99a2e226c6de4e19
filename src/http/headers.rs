//! Copy-on-write header collection and the shared message header API.
//!
//! # Design Decisions
//! - Names keep their original case; lookup is ASCII case-insensitive
//! - Insertion order is preserved so emitted headers are deterministic
//! - Name validation is deferred to finalize, where an invalid name is fatal

use std::sync::Arc;

use crate::error::RouterError;

/// Ordered mapping of header name to its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Arc<Vec<(String, Vec<String>)>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values for `name`, empty when absent.
    pub fn get(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(index) => &self.entries[index].1,
            None => &[],
        }
    }

    /// Values for `name` joined with `", "`.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with `name` set to exactly `value`.
    pub fn with(&self, name: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let entries = Arc::make_mut(&mut next.entries);
        match self.position(name) {
            Some(index) => entries[index].1 = vec![value.into()],
            None => entries.push((name.to_string(), vec![value.into()])),
        }
        next
    }

    /// Copy with `value` appended to `name`.
    pub fn with_added(&self, name: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let entries = Arc::make_mut(&mut next.entries);
        match self.position(name) {
            Some(index) => entries[index].1.push(value.into()),
            None => entries.push((name.to_string(), vec![value.into()])),
        }
        next
    }

    /// Copy without `name`; an absent name returns an unchanged copy.
    pub fn without(&self, name: &str) -> Self {
        let Some(index) = self.position(name) else {
            return self.clone();
        };
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).remove(index);
        next
    }

    /// Reject the first name with characters outside `[A-Za-z0-9-]`.
    pub fn validate_names(&self) -> Result<(), RouterError> {
        match self.entries.iter().find(|(name, _)| !is_valid_name(name)) {
            Some((name, _)) => Err(RouterError::InvalidHeaderName(name.clone())),
            None => Ok(()),
        }
    }
}

/// True when `name` is non-empty and only letters, digits and hyphens.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Header operations shared by requests and responses.
pub trait HttpMessage: Sized {
    fn headers(&self) -> &Headers;

    /// Copy of `self` carrying `headers`.
    fn replace_headers(&self, headers: Headers) -> Self;

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains(name)
    }

    fn header(&self, name: &str) -> &[String] {
        self.headers().get(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.headers().line(name)
    }

    fn with_header(&self, name: &str, value: impl Into<String>) -> Self {
        self.replace_headers(self.headers().with(name, value))
    }

    fn with_added_header(&self, name: &str, value: impl Into<String>) -> Self {
        self.replace_headers(self.headers().with_added(name, value))
    }

    fn without_header(&self, name: &str) -> Self {
        self.replace_headers(self.headers().without(name))
    }
}
