//! Data models for streaming plan processing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation phase of an implementation plan
///
/// Declaration order is the fixed phase order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    Initializing,
    Overview,
    Phases,
    Tasks,
    Timeline,
    Resources,
    Budget,
    Risks,
    Kpis,
    Next90Days,
    Finalizing,
    Complete,
}

impl GenerationPhase {
    /// Every phase in generation order
    pub const ORDER: [GenerationPhase; 12] = [
        GenerationPhase::Initializing,
        GenerationPhase::Overview,
        GenerationPhase::Phases,
        GenerationPhase::Tasks,
        GenerationPhase::Timeline,
        GenerationPhase::Resources,
        GenerationPhase::Budget,
        GenerationPhase::Risks,
        GenerationPhase::Kpis,
        GenerationPhase::Next90Days,
        GenerationPhase::Finalizing,
        GenerationPhase::Complete,
    ];

    /// Phases that carry plan content
    pub const CONTENT: [GenerationPhase; 9] = [
        GenerationPhase::Overview,
        GenerationPhase::Phases,
        GenerationPhase::Tasks,
        GenerationPhase::Timeline,
        GenerationPhase::Resources,
        GenerationPhase::Budget,
        GenerationPhase::Risks,
        GenerationPhase::Kpis,
        GenerationPhase::Next90Days,
    ];

    /// Position in [`GenerationPhase::ORDER`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The phase after this one, if any
    pub fn next(self) -> Option<GenerationPhase> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    /// Progress weight; all weights sum to 100
    pub fn weight(self) -> u32 {
        match self {
            GenerationPhase::Initializing => 5,
            GenerationPhase::Overview => 15,
            GenerationPhase::Phases => 20,
            GenerationPhase::Tasks => 25,
            GenerationPhase::Timeline => 10,
            GenerationPhase::Resources => 8,
            GenerationPhase::Budget => 7,
            GenerationPhase::Risks => 5,
            GenerationPhase::Kpis => 3,
            GenerationPhase::Next90Days => 2,
            GenerationPhase::Finalizing => 0,
            GenerationPhase::Complete => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenerationPhase::Initializing => "initializing",
            GenerationPhase::Overview => "overview",
            GenerationPhase::Phases => "phases",
            GenerationPhase::Tasks => "tasks",
            GenerationPhase::Timeline => "timeline",
            GenerationPhase::Resources => "resources",
            GenerationPhase::Budget => "budget",
            GenerationPhase::Risks => "risks",
            GenerationPhase::Kpis => "kpis",
            GenerationPhase::Next90Days => "next90days",
            GenerationPhase::Finalizing => "finalizing",
            GenerationPhase::Complete => "complete",
        }
    }

    /// Display title for the phase's section
    pub fn title(self) -> &'static str {
        match self {
            GenerationPhase::Initializing => "Preparing Plan",
            GenerationPhase::Overview => "Project Overview",
            GenerationPhase::Phases => "Implementation Phases",
            GenerationPhase::Tasks => "Key Tasks",
            GenerationPhase::Timeline => "Timeline & Milestones",
            GenerationPhase::Resources => "Resource Requirements",
            GenerationPhase::Budget => "Budget Breakdown",
            GenerationPhase::Risks => "Risk Assessment",
            GenerationPhase::Kpis => "Key Performance Indicators",
            GenerationPhase::Next90Days => "Next 90 Days",
            GenerationPhase::Finalizing => "Finalizing Plan",
            GenerationPhase::Complete => "Plan Complete",
        }
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A display section for one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSection {
    /// Always the phase name
    pub id: String,
    #[serde(rename = "type")]
    pub phase: GenerationPhase,
    pub title: String,
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_complete: bool,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Snapshot of generation progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingProgress {
    pub current_phase: GenerationPhase,
    pub completed_phases: Vec<GenerationPhase>,
    /// 0-100
    pub progress: u8,
    /// Milliseconds, only while progress is strictly between 10 and 95
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,
}

/// Result of feeding one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExtractionResult {
    pub sections: Vec<ProcessedSection>,
    pub progress: StreamingProgress,
    pub has_new_content: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_hundred() {
        let total: u32 = GenerationPhase::ORDER.iter().map(|p| p.weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_order_matches_index() {
        for (i, phase) in GenerationPhase::ORDER.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
        assert_eq!(GenerationPhase::Kpis.next(), Some(GenerationPhase::Next90Days));
        assert_eq!(GenerationPhase::Complete.next(), None);
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&GenerationPhase::Next90Days).unwrap();
        assert_eq!(json, "\"next90days\"");
        assert_eq!(GenerationPhase::Next90Days.to_string(), "next90days");
    }
}
