//! Streaming content processor
//!
//! Accumulates an LLM completion as it streams in and keeps a set of display
//! sections up to date:
//! - Parseable JSON is read through the typed plan schema and every phase
//!   with enough data becomes a complete section
//! - Unparseable buffers fall back to pattern-based bullets for the phase
//!   currently being generated
//! - Nothing here returns an error to the caller

use chrono::Utc;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::extractor::ContentExtractor;
use super::models::{
    ContentExtractionResult, GenerationPhase, ProcessedSection, StreamingProgress,
};
use super::parse::attempt_parse;
use super::progress::ProgressTracker;
use super::schema::PlanDocument;
use crate::config::StreamingConfig;
use crate::metrics::METRICS;

pub const DEFAULT_MAX_BUFFER_SIZE: usize = 50_000;

const MAX_PARTIAL_LINES: usize = 8;
const MAX_KEY_VALUES: usize = 5;
const MAX_SENTENCES: usize = 3;

static BULLET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[•\-\*]\s+(.+)$").expect("valid bullet pattern"));
static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+(.+)$").expect("valid numbered pattern"));
static KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""?([A-Za-z][A-Za-z0-9_ ]{0,40})"?\s*:\s*"?([^"\n{}\[\],]+)"?"#)
        .expect("valid key/value pattern")
});
static SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?\n]{20,}[.!?]").expect("valid sentence pattern"));

/// Incremental processor for one plan-generation stream
///
/// Not synchronised: one stream (one writer) per instance.
#[derive(Debug, Clone)]
pub struct StreamingContentProcessor {
    buffer: String,
    max_buffer_size: usize,
    /// Bytes appended over the session, unaffected by truncation
    total_received: usize,
    last_processed: usize,
    sections: IndexMap<GenerationPhase, ProcessedSection>,
    progress_tracker: ProgressTracker,
}

impl StreamingContentProcessor {
    pub fn new() -> Self {
        Self::with_max_buffer_size(DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(max_buffer_size: usize) -> Self {
        Self {
            buffer: String::new(),
            max_buffer_size,
            total_received: 0,
            last_processed: 0,
            sections: IndexMap::new(),
            progress_tracker: ProgressTracker::new(),
        }
    }

    pub fn from_config(config: &StreamingConfig) -> Self {
        Self::with_max_buffer_size(config.max_buffer_size)
    }

    /// Append a chunk and refresh sections and progress
    pub fn process_chunk(&mut self, chunk: &str) -> ContentExtractionResult {
        METRICS.plan_chunks.inc();

        self.buffer.push_str(chunk);
        self.total_received += chunk.len();
        self.enforce_buffer_cap();

        self.progress_tracker.detect_current_phase(&self.buffer);
        let has_new_content = self.extract_content();

        debug!(
            "Processed chunk: {} bytes, buffer={}, sections={}, new={}",
            chunk.len(),
            self.buffer.len(),
            self.sections.len(),
            has_new_content
        );

        ContentExtractionResult {
            sections: self.get_current_sections(),
            progress: self.get_progress(),
            has_new_content,
        }
    }

    pub fn get_current_sections(&self) -> Vec<ProcessedSection> {
        self.sections.values().cloned().collect()
    }

    pub fn get_progress(&self) -> StreamingProgress {
        self.progress_tracker.get_progress()
    }

    pub fn get_raw_content(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.total_received = 0;
        self.last_processed = 0;
        self.sections.clear();
        self.progress_tracker.reset();
    }

    /// Keep only the trailing `max_buffer_size` bytes, cut on a char boundary
    fn enforce_buffer_cap(&mut self) {
        if self.buffer.len() <= self.max_buffer_size {
            return;
        }

        let mut cut = self.buffer.len() - self.max_buffer_size;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        debug!("Buffer over capacity, dropping {} leading bytes", cut);
        self.buffer.drain(..cut);
    }

    /// Returns whether any section changed
    fn extract_content(&mut self) -> bool {
        if self.total_received <= self.last_processed {
            return false;
        }

        let changed = match attempt_parse(&self.buffer) {
            Some((value, strategy)) => {
                METRICS.record_parse(Some(strategy.as_str()));
                self.extract_from_parsed_data(&value)
            }
            None => {
                METRICS.record_parse(None);
                self.extract_partial_content()
            }
        };

        self.last_processed = self.total_received;
        changed
    }

    fn extract_from_parsed_data(&mut self, value: &Value) -> bool {
        let doc = PlanDocument::from_value(value);
        let mut changed = false;

        for phase in GenerationPhase::CONTENT {
            if !doc.has_enough_data(phase) {
                continue;
            }
            let Some(content) = ContentExtractor::from_document(&doc, phase) else {
                continue;
            };

            let section = ProcessedSection {
                id: phase.as_str().to_string(),
                phase,
                title: content.title.unwrap_or_else(|| phase.title().to_string()),
                content: content.bullet_points,
                description: content.description,
                is_complete: true,
                timestamp: Utc::now().timestamp_millis(),
            };
            changed |= self.store_section(section);
            self.progress_tracker.mark_phase_complete(phase);
        }

        changed
    }

    /// Best-effort bullets for the phase being generated
    fn extract_partial_content(&mut self) -> bool {
        let phase = self.progress_tracker.current_phase();
        if self.sections.get(&phase).map(|s| s.is_complete).unwrap_or(false) {
            return false;
        }

        let lines = partial_lines(&self.buffer);
        if lines.is_empty() {
            return false;
        }

        let section = ProcessedSection {
            id: phase.as_str().to_string(),
            phase,
            title: phase.title().to_string(),
            content: lines,
            description: None,
            is_complete: false,
            timestamp: Utc::now().timestamp_millis(),
        };
        self.store_section(section)
    }

    /// Insert or overwrite by phase; unchanged content keeps the old entry
    fn store_section(&mut self, section: ProcessedSection) -> bool {
        if let Some(existing) = self.sections.get(&section.phase) {
            if existing.is_complete && !section.is_complete {
                return false;
            }
            if existing.content == section.content
                && existing.description == section.description
                && existing.is_complete == section.is_complete
            {
                return false;
            }
        }

        METRICS.record_section(section.is_complete);
        self.sections.insert(section.phase, section);
        true
    }
}

impl Default for StreamingContentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Bullet, numbered and `key: value` lines; the last sentences otherwise
fn partial_lines(buffer: &str) -> Vec<String> {
    let mut lines: Vec<String> = BULLET_LINE
        .captures_iter(buffer)
        .chain(NUMBERED_LINE.captures_iter(buffer))
        .filter_map(|caps| clean(caps.get(1)?.as_str()))
        .collect();

    lines.extend(
        KEY_VALUE
            .captures_iter(buffer)
            .filter_map(|caps| {
                let value = caps.get(2)?.as_str();
                // "scheme: //host" is a URL, not a key/value pair
                if value.trim_start().starts_with("//") {
                    return None;
                }
                let key = clean(caps.get(1)?.as_str())?;
                let value = clean(value)?;
                Some(format!("{}: {}", key, value))
            })
            .take(MAX_KEY_VALUES),
    );

    if lines.is_empty() {
        let sentences: Vec<String> = SENTENCE
            .find_iter(buffer)
            .filter_map(|m| clean(m.as_str()))
            .collect();
        let skip = sentences.len().saturating_sub(MAX_SENTENCES);
        lines.extend(sentences.into_iter().skip(skip));
    }

    lines.truncate(MAX_PARTIAL_LINES);
    lines
}

fn clean(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_json_produces_complete_sections() {
        let mut processor = StreamingContentProcessor::new();
        let result = processor.process_chunk(
            r#"{"overview":{"goals":["Launch"]},"phases":[{"name":"Build","duration":"4w"}]}"#,
        );

        assert!(result.has_new_content);
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].id, "overview");
        assert_eq!(result.sections[0].content, vec!["Goal: Launch"]);
        assert!(result.sections[0].is_complete);
        assert_eq!(result.sections[1].content, vec!["Phase 1: Build (4w)"]);
        assert!(result
            .progress
            .completed_phases
            .contains(&GenerationPhase::Phases));
    }

    #[test]
    fn test_partial_content_for_current_phase() {
        let mut processor = StreamingContentProcessor::new();
        let result = processor.process_chunk(
            "Executive summary of the plan\n- Validate demand with 20 interviews\n- Build landing page\n",
        );

        assert_eq!(result.progress.current_phase, GenerationPhase::Overview);
        assert_eq!(result.sections.len(), 1);
        let section = &result.sections[0];
        assert_eq!(section.phase, GenerationPhase::Overview);
        assert!(!section.is_complete);
        assert_eq!(
            section.content,
            vec!["Validate demand with 20 interviews", "Build landing page"]
        );
    }

    #[test]
    fn test_complete_section_not_demoted() {
        let mut processor = StreamingContentProcessor::new();
        processor.process_chunk(r#"{"overview":{"goals":["Launch"]}}"#);
        // trailing text breaks the whole-buffer parse but the brace block still parses
        processor.process_chunk("\n- stray bullet");

        let sections = processor.get_current_sections();
        assert!(sections[0].is_complete);
        assert_eq!(sections[0].content, vec!["Goal: Launch"]);
    }

    #[test]
    fn test_no_new_content_on_empty_chunk() {
        let mut processor = StreamingContentProcessor::new();
        let first = processor.process_chunk(r#"{"risks":[{"item":"Churn"}]}"#);
        let second = processor.process_chunk("");

        assert!(first.has_new_content);
        assert!(!second.has_new_content);
        assert_eq!(first.sections, second.sections);
    }

    #[test]
    fn test_buffer_cap_keeps_tail() {
        let mut processor = StreamingContentProcessor::with_max_buffer_size(10);
        processor.process_chunk("abcdefgh");
        processor.process_chunk("ijklmnop");
        assert_eq!(processor.get_raw_content(), "ghijklmnop");
    }

    #[test]
    fn test_buffer_cap_respects_char_boundaries() {
        let mut processor = StreamingContentProcessor::with_max_buffer_size(5);
        processor.process_chunk("ééééé");
        let raw = processor.get_raw_content();
        assert!(raw.len() <= 5);
        assert!(raw.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_partial_lines_key_values_and_sentences() {
        let lines = partial_lines("Budget: 5000 dollars\nOwner: Ops team\n");
        assert_eq!(lines, vec!["Budget: 5000 dollars", "Owner: Ops team"]);

        let lines = partial_lines(
            "This first sentence is long enough. The second one is long enough too. \
             Third sentence also qualifies here! And the fourth is the last one?",
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "And the fourth is the last one?");
    }

    #[test]
    fn test_partial_lines_skip_bare_urls() {
        let lines = partial_lines("Owner: Alice\nSee https://news.test/a\n");
        assert_eq!(lines, vec!["Owner: Alice"]);

        let lines = partial_lines("Source: https://news.test/a\n");
        assert_eq!(lines, vec!["Source: https://news.test/a"]);
    }

    #[test]
    fn test_partial_lines_capped() {
        let text: String = (0..20).map(|i| format!("- item {}\n", i)).collect();
        assert_eq!(partial_lines(&text).len(), MAX_PARTIAL_LINES);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut processor = StreamingContentProcessor::new();
        processor.process_chunk(r#"{"tasks":[{"title":"T"}]}"#);
        processor.reset();

        assert!(processor.get_raw_content().is_empty());
        assert!(processor.get_current_sections().is_empty());
        assert_eq!(
            processor.get_progress().current_phase,
            GenerationPhase::Initializing
        );
    }
}
