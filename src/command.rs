//! A single line of renderer command text.
//!
//! The relay never interprets command text; it only guarantees that every
//! [`Command`] occupies exactly one line of the command file, in submission
//! order.

use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// One opaque renderer command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Command(String);

impl Command {
    /// Wrap `text` as a command.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidCommand`] if `text` contains a line
    /// break, since it would split into two lines of the command file.
    pub fn new(text: impl Into<String>) -> Result<Self, RelayError> {
        let text = text.into();
        if text.contains(['\n', '\r']) {
            return Err(RelayError::InvalidCommand(text));
        }
        Ok(Self(text))
    }

    /// The command text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the command text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the command text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the command, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Command {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Command {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
