use serde::{ Deserialize, Serialize };
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    FeverIllness,
    Respiratory,
    Digestive,
    SkinConditions,
    InjuriesWounds,
    MaternalHealth,
    ChildHealth,
    Nutrition,
    MentalHealth,
    PreventiveCare,
    Emergency,
}

/// How urgently a condition needs professional care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Self-care possible.
    Mild,
    /// May need consultation.
    Moderate,
    /// Requires immediate medical attention.
    Severe,
    /// Life-threatening.
    Emergency,
}

impl Severity {
    /// Whether advisories for this severity carry a "When to seek help" section.
    pub fn lists_escalation(&self) -> bool {
        matches!(self, Severity::Moderate | Severity::Severe)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Emergency => "emergency",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthCondition {
    pub id: String,
    pub name: String,
    pub category: HealthCategory,
    pub symptoms: Vec<String>,
    pub first_aid_steps: Vec<String>,
    pub when_to_seek_help: Vec<String>,
    pub prevention: Vec<String>,
    pub severity: Severity,
    /// Keyed by age group: "children", "adults", "elderly".
    #[serde(default)]
    pub age_specific: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl HealthCondition {
    pub fn matches(&self, lowercase_query: &str) -> bool {
        self.name.to_lowercase().contains(lowercase_query) ||
            self.symptoms.iter().any(|s| s.to_lowercase().contains(lowercase_query)) ||
            self.tags.iter().any(|t| t.to_lowercase().contains(lowercase_query))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthTip {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: HealthCategory,
    /// "summer", "winter", "monsoon" or "all".
    #[serde(default)]
    pub season: Option<String>,
    /// "children", "pregnant_women", "elderly" or "all".
    #[serde(default)]
    pub target_group: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub id: String,
    pub food_item: String,
    pub benefits: Vec<String>,
    pub good_for: Vec<String>,
    #[serde(default)]
    pub local_names: BTreeMap<String, String>,
    #[serde(default = "default_season")]
    pub season: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub number: String,
    pub description: String,
    #[serde(default = "default_availability")]
    pub availability: String,
}

fn default_season() -> String {
    "all".to_string()
}

fn default_availability() -> String {
    "24/7".to_string()
}
