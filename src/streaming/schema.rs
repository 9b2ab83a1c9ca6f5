//! Typed view of an implementation-plan document
//!
//! Every field is optional and deserializes leniently: a field of the wrong
//! shape becomes its default instead of failing the whole document, and list
//! entries that cannot be read are skipped.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::models::GenerationPhase;

/// Deserialize anything, falling back to `T::default()` on a shape mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a list, keeping only the entries that fit `T`
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Deserialize a scalar as display text; numbers and booleans are stringified
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value))
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// List entries that may be bare strings or objects with a text field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextItem(pub Option<String>);

impl<'de> Deserialize<'de> for TextItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let text = match &value {
            Value::Object(map) => ["title", "name", "task", "item", "description", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(scalar_text)),
            other => scalar_text(other),
        };
        Ok(TextItem(text))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub goals: Vec<TextItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub success_criteria: Vec<TextItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub assumptions: Vec<TextItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseItem {
    #[serde(default, deserialize_with = "lenient_text", alias = "title")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskItem {
    #[serde(default, deserialize_with = "lenient_text", alias = "name")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub effort: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Milestone {
    #[serde(default, deserialize_with = "lenient_text", alias = "name")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "date")]
    pub due: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timeline {
    #[serde(default, deserialize_with = "lenient_text", alias = "startDate")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "endDate")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamMember {
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vendor {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resources {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub team: Vec<TeamMember>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub vendors: Vec<Vendor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetItem {
    #[serde(default, deserialize_with = "lenient_text", alias = "item", alias = "category")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "amount")]
    pub cost: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Budget {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub items: Vec<BudgetItem>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub total: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Risk {
    #[serde(default, deserialize_with = "lenient_text", alias = "risk")]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub likelihood: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Kpi {
    #[serde(default, deserialize_with = "lenient_text", alias = "name")]
    pub metric: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cadence: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Next90Days {
    #[serde(default, deserialize_with = "lenient_vec", alias = "days30", alias = "30")]
    pub day30: Vec<TextItem>,
    #[serde(default, deserialize_with = "lenient_vec", alias = "days60", alias = "60")]
    pub day60: Vec<TextItem>,
    #[serde(default, deserialize_with = "lenient_vec", alias = "days90", alias = "90")]
    pub day90: Vec<TextItem>,
}

/// Whole plan document as emitted by the model
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub overview: Option<Overview>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub phases: Vec<PhaseItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tasks: Vec<TaskItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub timeline: Option<Timeline>,
    #[serde(default, deserialize_with = "lenient")]
    pub resources: Option<Resources>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget: Option<Budget>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub risks: Vec<Risk>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub kpis: Vec<Kpi>,
    #[serde(default, deserialize_with = "lenient", alias = "next90days", alias = "next_90_days")]
    pub next90_days: Option<Next90Days>,
}

impl PlanDocument {
    /// Read a document from any JSON value; non-objects yield an empty plan
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Whether the document carries enough data to render `phase`
    pub fn has_enough_data(&self, phase: GenerationPhase) -> bool {
        match phase {
            GenerationPhase::Overview => self
                .overview
                .as_ref()
                .map(|o| !o.goals.is_empty() || !o.success_criteria.is_empty())
                .unwrap_or(false),
            GenerationPhase::Phases => !self.phases.is_empty(),
            GenerationPhase::Tasks => !self.tasks.is_empty(),
            GenerationPhase::Timeline => self
                .timeline
                .as_ref()
                .map(|t| !t.milestones.is_empty() || t.start.is_some() || t.end.is_some())
                .unwrap_or(false),
            GenerationPhase::Resources => self
                .resources
                .as_ref()
                .map(|r| !r.team.is_empty() || !r.vendors.is_empty())
                .unwrap_or(false),
            GenerationPhase::Budget => self
                .budget
                .as_ref()
                .map(|b| !b.items.is_empty() || b.total.is_some())
                .unwrap_or(false),
            GenerationPhase::Risks => !self.risks.is_empty(),
            GenerationPhase::Kpis => !self.kpis.is_empty(),
            GenerationPhase::Next90Days => self
                .next90_days
                .as_ref()
                .map(|n| !n.day30.is_empty() || !n.day60.is_empty() || !n.day90.is_empty())
                .unwrap_or(false),
            GenerationPhase::Initializing
            | GenerationPhase::Finalizing
            | GenerationPhase::Complete => false,
        }
    }
}
