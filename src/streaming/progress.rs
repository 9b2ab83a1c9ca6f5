//! Phase tracking and progress estimation
//!
//! Phase detection is a substring heuristic over the accumulated stream, not
//! a JSON-aware parse: a buffer that mentions a later section's keyword moves
//! the tracker forward even before that section has real content. Phases only
//! ever advance.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::debug;

use super::models::{GenerationPhase, StreamingProgress};

/// Keyword sets checked from the most advanced phase to the earliest
const PHASE_PATTERNS: [(GenerationPhase, &[&str]); 9] = [
    (
        GenerationPhase::Next90Days,
        &["next90days", "next_90_days", "next 90 days", "first 30 days"],
    ),
    (
        GenerationPhase::Kpis,
        &["\"kpis\"", "key performance indicator", "success metrics"],
    ),
    (
        GenerationPhase::Risks,
        &["\"risks\"", "risk assessment", "mitigation"],
    ),
    (
        GenerationPhase::Budget,
        &["\"budget\"", "cost breakdown", "total budget"],
    ),
    (
        GenerationPhase::Resources,
        &["\"resources\"", "team members", "\"vendors\""],
    ),
    (
        GenerationPhase::Timeline,
        &["\"timeline\"", "\"milestones\"", "milestone"],
    ),
    (
        GenerationPhase::Tasks,
        &["\"tasks\"", "action items"],
    ),
    (
        GenerationPhase::Phases,
        &["\"phases\"", "implementation phases", "phase 1"],
    ),
    (
        GenerationPhase::Overview,
        &["\"overview\"", "\"goals\"", "success criteria", "executive summary"],
    ),
];

const COMPLETION_MARKERS: [&str; 4] = ["}", "complete", "finished", "done"];

/// Completed phases required before completion markers move to finalizing
const FINALIZING_MIN_COMPLETED: usize = 6;

/// Tracks the active generation phase and derives a progress estimate
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    completed: BTreeSet<GenerationPhase>,
    current: GenerationPhase,
    started_at: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            completed: BTreeSet::new(),
            current: GenerationPhase::Initializing,
            started_at: Instant::now(),
        }
    }

    pub fn current_phase(&self) -> GenerationPhase {
        self.current
    }

    pub fn is_completed(&self, phase: GenerationPhase) -> bool {
        self.completed.contains(&phase)
    }

    /// Advance the current phase based on keywords in the full buffer
    pub fn detect_current_phase(&mut self, content: &str) -> GenerationPhase {
        let lower = content.to_lowercase();

        let detected = PHASE_PATTERNS.iter().find(|(phase, keywords)| {
            *phase > self.current && keywords.iter().any(|k| lower.contains(k))
        });

        if let Some((phase, _)) = detected {
            self.advance_to(*phase);
        } else if self.current < GenerationPhase::Finalizing
            && self.completed.len() >= FINALIZING_MIN_COMPLETED
            && COMPLETION_MARKERS.iter().any(|m| lower.contains(m))
        {
            self.advance_to(GenerationPhase::Finalizing);
        }

        self.current
    }

    /// Mark a phase complete; completing the current phase moves to the next
    pub fn mark_phase_complete(&mut self, phase: GenerationPhase) {
        self.completed.insert(phase);

        if phase == self.current {
            if let Some(next) = phase.next() {
                debug!("Phase {} complete, advancing to {}", phase, next);
                self.current = next;
            }
        }
    }

    /// Weighted completion percentage (0-100)
    pub fn calculate_progress(&self) -> u8 {
        let total: u32 = GenerationPhase::ORDER.iter().map(|p| p.weight()).sum();
        if total == 0 {
            return 0;
        }

        let mut weight: f64 = self.completed.iter().map(|p| p.weight() as f64).sum();
        if !self.completed.contains(&self.current) {
            weight += self.current.weight() as f64 * 0.5;
        }

        (100.0 * weight / total as f64).round().min(100.0) as u8
    }

    /// Remaining time in milliseconds, extrapolated linearly from elapsed time
    pub fn estimate_time_remaining(&self) -> Option<u64> {
        estimate_remaining(self.calculate_progress(), self.started_at.elapsed())
    }

    pub fn get_progress(&self) -> StreamingProgress {
        StreamingProgress {
            current_phase: self.current,
            completed_phases: self.completed.iter().copied().collect(),
            progress: self.calculate_progress(),
            estimated_time_remaining: self.estimate_time_remaining(),
        }
    }

    pub fn reset(&mut self) {
        self.completed.clear();
        self.current = GenerationPhase::Initializing;
        self.started_at = Instant::now();
    }

    fn advance_to(&mut self, phase: GenerationPhase) {
        debug!("Phase advanced: {} -> {}", self.current, phase);
        self.current = phase;
        self.completed
            .extend(GenerationPhase::ORDER.iter().copied().filter(|p| *p < phase));
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Only meaningful strictly inside the 10-95 band
fn estimate_remaining(progress: u8, elapsed: Duration) -> Option<u64> {
    if progress <= 10 || progress >= 95 {
        return None;
    }

    let elapsed_ms = elapsed.as_millis() as f64;
    let estimated_total = elapsed_ms / progress as f64 * 100.0;
    Some((estimated_total - elapsed_ms).max(0.0).round() as u64)
}
