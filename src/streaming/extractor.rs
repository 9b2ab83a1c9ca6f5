//! Phase-specific formatting of plan data into display bullets

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::GenerationPhase;
use super::schema::{
    Budget, Kpi, Next90Days, Overview, PhaseItem, PlanDocument, Resources, Risk, TaskItem,
    TextItem, Timeline,
};

const MAX_TASKS: usize = 8;
const MAX_MILESTONES: usize = 5;
const MAX_ITEMS_PER_BUCKET: usize = 3;

/// Readable content for one phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub bullet_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Turns (partially) parsed plan JSON into bullets for a phase
pub struct ContentExtractor;

impl ContentExtractor {
    /// Extract bullets for `phase`. Missing or malformed fields are skipped;
    /// phases without a dedicated formatter get a per-key summary.
    pub fn extract_readable_content(data: &Value, phase: GenerationPhase) -> ExtractedContent {
        let doc = PlanDocument::from_value(data);
        Self::from_document(&doc, phase).unwrap_or_else(|| Self::generic(data))
    }

    /// Formatter for an already-read document; `None` for phases without one
    pub fn from_document(doc: &PlanDocument, phase: GenerationPhase) -> Option<ExtractedContent> {
        let content = match phase {
            GenerationPhase::Overview => {
                Self::overview(doc.overview.as_ref().unwrap_or(&Default::default()))
            }
            GenerationPhase::Phases => Self::phases(&doc.phases),
            GenerationPhase::Tasks => Self::tasks(&doc.tasks),
            GenerationPhase::Timeline => {
                Self::timeline(doc.timeline.as_ref().unwrap_or(&Default::default()))
            }
            GenerationPhase::Resources => {
                Self::resources(doc.resources.as_ref().unwrap_or(&Default::default()))
            }
            GenerationPhase::Budget => {
                Self::budget(doc.budget.as_ref().unwrap_or(&Default::default()))
            }
            GenerationPhase::Risks => Self::risks(&doc.risks),
            GenerationPhase::Kpis => Self::kpis(&doc.kpis),
            GenerationPhase::Next90Days => {
                Self::next90_days(doc.next90_days.as_ref().unwrap_or(&Default::default()))
            }
            GenerationPhase::Initializing
            | GenerationPhase::Finalizing
            | GenerationPhase::Complete => return None,
        };
        Some(content)
    }

    /// One summary bullet per top-level key
    pub fn generic(data: &Value) -> ExtractedContent {
        let bullet_points = match data {
            Value::Object(map) if !map.is_empty() => map
                .iter()
                .map(|(key, value)| match value {
                    Value::Array(items) => format!("{}: {} items", key, items.len()),
                    Value::String(s) => format!("{}: {}", key, s),
                    _ => format!("{}: [object]", key),
                })
                .collect(),
            Value::Object(_) => vec!["Content being processed...".to_string()],
            _ => vec!["Processing content...".to_string()],
        };

        ExtractedContent {
            title: None,
            bullet_points,
            description: None,
        }
    }

    fn overview(overview: &Overview) -> ExtractedContent {
        let labelled = |prefix: &str, items: &[TextItem]| -> Vec<String> {
            texts(items).map(|t| format!("{}: {}", prefix, t)).collect()
        };

        let mut bullets = labelled("Goal", &overview.goals);
        bullets.extend(labelled("Success", &overview.success_criteria));
        bullets.extend(labelled("Assumption", &overview.assumptions));

        titled(GenerationPhase::Overview, bullets, None)
    }

    fn phases(phases: &[PhaseItem]) -> ExtractedContent {
        let bullets = phases
            .iter()
            .enumerate()
            .filter_map(|(i, phase)| {
                let name = phase.name.as_ref()?;
                Some(format!("Phase {}: {}{}", i + 1, name, parenthesized(&phase.duration)))
            })
            .collect();

        let description = Some(format!("{} phases planned", phases.len()));
        titled(GenerationPhase::Phases, bullets, description)
    }

    fn tasks(tasks: &[TaskItem]) -> ExtractedContent {
        let bullets = tasks
            .iter()
            .take(MAX_TASKS)
            .filter_map(|task| {
                let title = task.title.as_ref()?;
                Some(format!("{}{}", title, parenthesized(&task.effort)))
            })
            .collect();

        let description = if tasks.len() > MAX_TASKS {
            format!("{} tasks identified (showing first {})", tasks.len(), MAX_TASKS)
        } else {
            format!("{} tasks identified", tasks.len())
        };

        titled(GenerationPhase::Tasks, bullets, Some(description))
    }

    fn timeline(timeline: &Timeline) -> ExtractedContent {
        let mut bullets = Vec::new();
        if let Some(start) = &timeline.start {
            bullets.push(format!("Start: {}", start));
        }
        if let Some(end) = &timeline.end {
            bullets.push(format!("End: {}", end));
        }
        bullets.extend(
            timeline
                .milestones
                .iter()
                .take(MAX_MILESTONES)
                .filter_map(|m| {
                    let title = m.title.as_ref()?;
                    Some(format!("Milestone: {}{}", title, parenthesized(&m.due)))
                }),
        );

        titled(GenerationPhase::Timeline, bullets, None)
    }

    fn resources(resources: &Resources) -> ExtractedContent {
        let mut bullets: Vec<String> = resources
            .team
            .iter()
            .filter_map(|member| {
                let role = member.role.as_ref()?;
                Some(format!("{}{}", role, parenthesized(&member.count)))
            })
            .collect();
        bullets.extend(
            resources
                .vendors
                .iter()
                .filter_map(|v| v.name.as_ref().map(|name| format!("Vendor: {}", name))),
        );

        titled(GenerationPhase::Resources, bullets, None)
    }

    fn budget(budget: &Budget) -> ExtractedContent {
        let mut bullets: Vec<String> = budget
            .items
            .iter()
            .filter_map(|item| match (&item.label, &item.cost) {
                (Some(label), Some(cost)) => Some(format!("{}: {}", label, cost)),
                _ => None,
            })
            .collect();
        if let Some(total) = &budget.total {
            bullets.push(format!("Total Budget: {}", total));
        }

        titled(GenerationPhase::Budget, bullets, None)
    }

    fn risks(risks: &[Risk]) -> ExtractedContent {
        let bullets = risks
            .iter()
            .filter_map(|risk| {
                let item = risk.item.as_ref()?;
                Some(format!(
                    "{} ({}/{})",
                    item,
                    risk.likelihood.as_deref().unwrap_or("unknown"),
                    risk.impact.as_deref().unwrap_or("unknown"),
                ))
            })
            .collect();

        titled(GenerationPhase::Risks, bullets, None)
    }

    fn kpis(kpis: &[Kpi]) -> ExtractedContent {
        let bullets = kpis
            .iter()
            .filter_map(|kpi| {
                let metric = kpi.metric.as_ref()?;
                Some(format!(
                    "{}: {}{}",
                    metric,
                    kpi.target.as_deref().unwrap_or("TBD"),
                    parenthesized(&kpi.cadence),
                ))
            })
            .collect();

        titled(GenerationPhase::Kpis, bullets, None)
    }

    fn next90_days(plan: &Next90Days) -> ExtractedContent {
        let buckets = [
            ("First 30 days:", &plan.day30),
            ("Days 31-60:", &plan.day60),
            ("Days 61-90:", &plan.day90),
        ];

        let mut bullets = Vec::new();
        for (header, items) in buckets {
            let entries: Vec<&str> = texts(items).take(MAX_ITEMS_PER_BUCKET).collect();
            if entries.is_empty() {
                continue;
            }
            bullets.push(header.to_string());
            bullets.extend(entries.into_iter().map(|e| format!("  • {}", e)));
        }

        titled(GenerationPhase::Next90Days, bullets, None)
    }
}

fn texts(items: &[TextItem]) -> impl Iterator<Item = &str> {
    items.iter().filter_map(|item| item.0.as_deref())
}

fn parenthesized(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(|v| format!(" ({})", v))
        .unwrap_or_default()
}

fn titled(
    phase: GenerationPhase,
    bullet_points: Vec<String>,
    description: Option<String>,
) -> ExtractedContent {
    ExtractedContent {
        title: Some(phase.title().to_string()),
        bullet_points,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bullets(data: Value, phase: GenerationPhase) -> Vec<String> {
        ContentExtractor::extract_readable_content(&data, phase).bullet_points
    }

    #[test]
    fn test_overview_prefixes() {
        let out = bullets(
            json!({"overview": {
                "goals": ["Launch MVP"],
                "successCriteria": ["100 users"],
                "assumptions": ["Funding secured"]
            }}),
            GenerationPhase::Overview,
        );
        assert_eq!(
            out,
            vec!["Goal: Launch MVP", "Success: 100 users", "Assumption: Funding secured"]
        );
    }

    #[test]
    fn test_phases_numbering_and_duration() {
        let out = bullets(
            json!({"phases": [{"name": "Discovery", "duration": "2 weeks"}, {"name": "Build"}]}),
            GenerationPhase::Phases,
        );
        assert_eq!(out, vec!["Phase 1: Discovery (2 weeks)", "Phase 2: Build"]);
    }

    #[test]
    fn test_tasks_truncated_to_eight() {
        let tasks: Vec<Value> = (1..=10)
            .map(|i| json!({"title": format!("Task {}", i), "effort": "1d"}))
            .collect();
        let content = ContentExtractor::extract_readable_content(
            &json!({ "tasks": tasks }),
            GenerationPhase::Tasks,
        );

        assert_eq!(content.bullet_points.len(), 8);
        assert_eq!(content.bullet_points[0], "Task 1 (1d)");
        assert_eq!(
            content.description.as_deref(),
            Some("10 tasks identified (showing first 8)")
        );
    }

    #[test]
    fn test_timeline_limits_milestones() {
        let milestones: Vec<Value> = (1..=7)
            .map(|i| json!({"title": format!("M{}", i), "due": "Q1"}))
            .collect();
        let out = bullets(
            json!({"timeline": {"start": "Jan", "end": "Jun", "milestones": milestones}}),
            GenerationPhase::Timeline,
        );
        assert_eq!(out.len(), 7);
        assert_eq!(out[0], "Start: Jan");
        assert_eq!(out[1], "End: Jun");
        assert_eq!(out[2], "Milestone: M1 (Q1)");
    }

    #[test]
    fn test_resources_budget_risks_kpis() {
        let data = json!({
            "resources": {"team": [{"role": "Engineer", "count": 2}], "vendors": [{"name": "AWS"}]},
            "budget": {"items": [{"label": "Marketing", "cost": "$5,000"}], "total": "$20,000"},
            "risks": [{"item": "Churn", "likelihood": "medium", "impact": "high"}],
            "kpis": [{"metric": "MRR", "target": "$10k", "cadence": "monthly"}, {"metric": "NPS"}]
        });

        assert_eq!(
            bullets(data.clone(), GenerationPhase::Resources),
            vec!["Engineer (2)", "Vendor: AWS"]
        );
        assert_eq!(
            bullets(data.clone(), GenerationPhase::Budget),
            vec!["Marketing: $5,000", "Total Budget: $20,000"]
        );
        assert_eq!(
            bullets(data.clone(), GenerationPhase::Risks),
            vec!["Churn (medium/high)"]
        );
        assert_eq!(
            bullets(data, GenerationPhase::Kpis),
            vec!["MRR: $10k (monthly)", "NPS: TBD"]
        );
    }

    #[test]
    fn test_next90_days_buckets() {
        let out = bullets(
            json!({"next90Days": {
                "day30": ["a", "b", "c", "d"],
                "day60": [],
                "day90": ["z"]
            }}),
            GenerationPhase::Next90Days,
        );
        assert_eq!(
            out,
            vec!["First 30 days:", "  • a", "  • b", "  • c", "Days 61-90:", "  • z"]
        );
    }

    #[test]
    fn test_missing_fields_yield_empty_bullets() {
        let out = bullets(json!({"overview": {"goals": "oops"}}), GenerationPhase::Overview);
        assert!(out.is_empty());
        let out = bullets(json!({}), GenerationPhase::Risks);
        assert!(out.is_empty());
    }

    #[test]
    fn test_generic_summary() {
        let out = bullets(
            json!({"items": [1, 2], "status": "ok", "meta": {"a": 1}}),
            GenerationPhase::Finalizing,
        );
        assert!(out.contains(&"items: 2 items".to_string()));
        assert!(out.contains(&"status: ok".to_string()));
        assert!(out.contains(&"meta: [object]".to_string()));

        let out = bullets(json!("plain"), GenerationPhase::Complete);
        assert_eq!(out, vec!["Processing content..."]);
    }

    #[test]
    fn test_generic_summary_keeps_document_order() {
        let data: Value = serde_json::from_str(r#"{"zeta": "last", "alpha": [1], "mid": 2}"#).unwrap();
        let out = ContentExtractor::generic(&data).bullet_points;
        assert_eq!(out, vec!["zeta: last", "alpha: 1 items", "mid: [object]"]);
    }
}
