//! Ordered JSON parse strategies for a partially streamed buffer
//!
//! Each strategy is more permissive than the one before it. The first one
//! that yields a value wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static GREEDY_BRACE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid brace block pattern"));

/// A single way of recovering JSON from the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The trimmed buffer is itself a `{...}` document
    WholeBuffer,
    /// The first greedy `{...}` match in the buffer
    GreedyBraceBlock,
    /// Substring between the first `{` and the last `}`
    BraceSubstring,
}

impl ParseStrategy {
    pub const CASCADE: [ParseStrategy; 3] = [
        ParseStrategy::WholeBuffer,
        ParseStrategy::GreedyBraceBlock,
        ParseStrategy::BraceSubstring,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParseStrategy::WholeBuffer => "whole_buffer",
            ParseStrategy::GreedyBraceBlock => "greedy_brace_block",
            ParseStrategy::BraceSubstring => "brace_substring",
        }
    }

    /// Try this strategy alone
    pub fn attempt(self, buffer: &str) -> Option<Value> {
        let candidate = match self {
            ParseStrategy::WholeBuffer => {
                let trimmed = buffer.trim();
                if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
                    return None;
                }
                trimmed
            }
            ParseStrategy::GreedyBraceBlock => GREEDY_BRACE_BLOCK.find(buffer)?.as_str(),
            ParseStrategy::BraceSubstring => {
                let start = buffer.find('{')?;
                let end = buffer.rfind('}')?;
                if end <= start {
                    return None;
                }
                &buffer[start..=end]
            }
        };

        match serde_json::from_str(candidate) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Parse strategy {} failed: {}", self.as_str(), e);
                None
            }
        }
    }
}

/// Run the cascade; `None` when every strategy fails
pub fn attempt_parse(buffer: &str) -> Option<(Value, ParseStrategy)> {
    ParseStrategy::CASCADE
        .iter()
        .find_map(|strategy| strategy.attempt(buffer).map(|value| (value, *strategy)))
}
