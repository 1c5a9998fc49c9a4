//! Rotating progress messages shown while a request is outstanding.
//!
//! The messages are cosmetic: they advance on a timer and say nothing
//! about actual server progress.

use std::time::Duration;

/// Time each message stays on screen.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(3);

/// Messages shown while a guide is being generated.
pub const GENERATION_MESSAGES: &[&str] = &[
    "Reading your slides...",
    "Extracting lesson content...",
    "Drafting the session overview...",
    "Writing learning objectives...",
    "Planning the lesson procedure...",
    "Building the glossary...",
    "Polishing your teacher guide...",
];

/// Messages shown while a PDF is being rendered.
pub const EXPORT_MESSAGES: &[&str] = &["Preparing your PDF...", "Laying out pages..."];

/// Cycles through a fixed list of messages.
#[derive(Debug, Clone)]
pub struct StatusRotator {
    messages: Vec<String>,
    index: usize,
}

impl StatusRotator {
    /// Create a rotator positioned on the first message.
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            index: 0,
        }
    }

    /// The message currently shown. Empty when there are no messages.
    pub fn current(&self) -> &str {
        self.messages
            .get(self.index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Move to the next message, wrapping after the last one.
    pub fn advance(&mut self) -> &str {
        if !self.messages.is_empty() {
            self.index = (self.index + 1) % self.messages.len();
        }
        self.current()
    }

    /// Go back to the first message.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for StatusRotator {
    fn default() -> Self {
        Self::new(GENERATION_MESSAGES.iter().copied())
    }
}
