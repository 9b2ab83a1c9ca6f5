//! Streaming implementation-plan processing
//!
//! Turns an incrementally arriving LLM completion (usually partial JSON)
//! into display sections with phase and progress tracking. Malformed input
//! degrades to best-effort bullets instead of failing.

pub mod extractor;
pub mod models;
pub mod parse;
pub mod processor;
pub mod progress;
pub mod schema;

pub use extractor::{ContentExtractor, ExtractedContent};
pub use models::{ContentExtractionResult, GenerationPhase, ProcessedSection, StreamingProgress};
pub use parse::{attempt_parse, ParseStrategy};
pub use processor::StreamingContentProcessor;
pub use progress::ProgressTracker;
pub use schema::PlanDocument;
