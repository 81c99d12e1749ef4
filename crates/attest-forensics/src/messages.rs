//! Candidate cleartext messages

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::ScanError;

/// Built-in messages tried when the caller supplies none of their own.
pub const DEFAULT_MESSAGES: &[&str] = &["", "test", "hello", "Hello, world!", "attest"];

/// Ordered, deduplicated list of messages to try.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDictionary {
    messages: Vec<String>,
    seen: HashSet<String>,
}

impl MessageDictionary {
    /// An empty dictionary.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in messages.
    pub fn with_defaults() -> Self {
        let mut dict = Self::empty();
        for message in DEFAULT_MESSAGES {
            dict.add(message);
        }
        dict
    }

    /// Add a message. Returns `false` if it was already present.
    pub fn add(&mut self, message: &str) -> bool {
        if !self.seen.insert(message.to_string()) {
            return false;
        }
        self.messages.push(message.to_string());
        true
    }

    /// Add one message per line; blank lines are skipped and `\r` is stripped.
    pub fn extend_from_lines(&mut self, text: &str) -> usize {
        text.lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .filter(|line| self.add(line))
            .count()
    }

    /// Add messages from a file, one per line.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ScanError> {
        let text = fs::read_to_string(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let added = self.extend_from_lines(&text);
        log::debug!("added {} messages from {}", added, path.display());
        Ok(added)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
