use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ContentKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Caution,
    Warning,
    Danger,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "caution" => Some(Self::Caution),
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Tutorial,
    Video,
    Product,
    #[default]
    Reference,
}

impl LinkType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tutorial" => Some(Self::Tutorial),
            "video" => Some(Self::Video),
            "product" => Some(Self::Product),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

/// A stated measurement with its metric and imperial renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementConversion {
    pub original: String,
    pub metric: String,
    pub imperial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpfulLink {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
}

/// A material (tutorials) or ingredient (recipes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub measurement: Option<MeasurementConversion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub notes: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillReference {
    pub skill_name: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub search_query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyWarning {
    pub warning: String,
    pub severity: Severity,
    pub ppe_required: Vec<String>,
}

/// One actionable step. `step_number` is 1-based and sequential after any
/// filtering done by the extraction side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step_number: u32,
    pub title: String,
    pub instructions: String,
    pub tips: Option<String>,
    pub image_urls: Vec<String>,
    pub measurements: Vec<MeasurementConversion>,
    pub helpful_links: Vec<HelpfulLink>,
    pub skill_references: Vec<SkillReference>,
    pub safety_warnings: Vec<SafetyWarning>,
}

/// One tutorial or recipe with its full ordered tree of child records.
///
/// Glossary and tools stay empty for recipes; prep/cook times stay empty for
/// tutorials (their single estimate lands in `total_time`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub title: String,
    pub overview: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub difficulty: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<i64>,
    pub source_url: Option<String>,
    pub glossary: Vec<GlossaryTerm>,
    pub materials: Vec<Material>,
    pub tools: Vec<Tool>,
    pub steps: Vec<Step>,
}

impl ContentItem {
    pub fn empty(kind: ContentKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            overview: String::new(),
            image_url: None,
            author: None,
            author_url: None,
            difficulty: None,
            prep_time: None,
            cook_time: None,
            total_time: None,
            servings: None,
            source_url: None,
            glossary: Vec::new(),
            materials: Vec::new(),
            tools: Vec::new(),
            steps: Vec::new(),
        }
    }
}

/// A persisted aggregate: the storage-assigned id and creation time around
/// the value model, so equality checks on `content` are unaffected by either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub content: ContentItem,
}

/// Listing row for stored aggregates, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItemType {
    Material,
    Tool,
}

impl ChecklistItemType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "material" => Some(Self::Material),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Tool => "tool",
        }
    }
}

/// A shopping/materials checklist entry. Rows are snapshots copied out of an
/// aggregate's materials and required tools; `item_id` is a plain
/// back-reference that outlives the source aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub checked: bool,
    pub item_type: ChecklistItemType,
    pub item_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, LinkType, Severity};

    #[test]
    fn enum_defaults_match_the_declared_schema_defaults() {
        assert_eq!(Difficulty::default(), Difficulty::Beginner);
        assert_eq!(Severity::default(), Severity::Caution);
        assert_eq!(LinkType::default(), LinkType::Reference);
    }

    #[test]
    fn enum_parsing_is_case_insensitive_and_strict() {
        assert_eq!(Severity::parse("DANGER"), Some(Severity::Danger));
        assert_eq!(Severity::parse("fatal"), None);
        assert_eq!(Difficulty::parse(" advanced "), Some(Difficulty::Advanced));
        assert_eq!(LinkType::parse("video"), Some(LinkType::Video));
    }
}
