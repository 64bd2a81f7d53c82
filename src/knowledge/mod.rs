pub mod data;
pub mod keywords;

use chrono::{ Datelike, NaiveDate };
use log::info;
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::health::{
    EmergencyContact,
    HealthCategory,
    HealthCondition,
    HealthTip,
    NutritionInfo,
};

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse knowledge file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("knowledge file '{0}' contains no conditions")]
    Empty(String),
}

/// On-disk shape of a knowledge dataset.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KnowledgeDataset {
    #[serde(default)]
    pub conditions: Vec<HealthCondition>,
    #[serde(default)]
    pub tips: Vec<HealthTip>,
    #[serde(default)]
    pub nutrition: Vec<NutritionInfo>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Read-only reference data. Declaration order is significant: searches
/// return records in the order they were supplied.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    conditions: Vec<HealthCondition>,
    tips: Vec<HealthTip>,
    nutrition: Vec<NutritionInfo>,
    emergency_contacts: Vec<EmergencyContact>,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeStore {
    pub fn new(dataset: KnowledgeDataset) -> Self {
        Self {
            conditions: dataset.conditions,
            tips: dataset.tips,
            nutrition: dataset.nutrition,
            emergency_contacts: dataset.emergency_contacts,
        }
    }

    pub fn builtin() -> Self {
        Self::new(KnowledgeDataset {
            conditions: data::conditions(),
            tips: data::tips(),
            nutrition: data::nutrition(),
            emergency_contacts: data::emergency_contacts(),
        })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let display = path.as_ref().display().to_string();
        let text = fs::read_to_string(&path).map_err(|source| KnowledgeError::Io {
            path: display.clone(),
            source,
        })?;
        let dataset: KnowledgeDataset = serde_json
            ::from_str(&text)
            .map_err(|source| KnowledgeError::Parse { path: display.clone(), source })?;
        if dataset.conditions.is_empty() {
            return Err(KnowledgeError::Empty(display));
        }
        info!(
            "Loaded knowledge base from {}: {} conditions, {} tips, {} nutrition records, {} contacts",
            display,
            dataset.conditions.len(),
            dataset.tips.len(),
            dataset.nutrition.len(),
            dataset.emergency_contacts.len()
        );
        Ok(Self::new(dataset))
    }

    pub fn conditions(&self) -> &[HealthCondition] {
        &self.conditions
    }

    pub fn condition(&self, id: &str) -> Option<&HealthCondition> {
        self.conditions.iter().find(|c| c.id == id)
    }

    /// Conditions whose name, any symptom, or any tag contains `query`,
    /// ignoring case.
    pub fn search_health_info(&self, query: &str) -> Vec<&HealthCondition> {
        let query = query.to_lowercase();
        self.conditions
            .iter()
            .filter(|condition| condition.matches(&query))
            .collect()
    }

    pub fn get_health_tips(
        &self,
        category: Option<HealthCategory>,
        season: Option<&str>
    ) -> Vec<&HealthTip> {
        self.tips
            .iter()
            .filter(|tip| category.map_or(true, |c| tip.category == c))
            .filter(|tip| {
                match season {
                    None => true,
                    Some(wanted) =>
                        matches!(tip.season.as_deref(), Some("all")) ||
                            tip.season.as_deref() == Some(wanted),
                }
            })
            .collect()
    }

    /// Tip of the day, rotating through the tip list by day of year.
    pub fn daily_tip(&self, date: NaiveDate) -> Option<&HealthTip> {
        if self.tips.is_empty() {
            return None;
        }
        let index = (date.ordinal0() as usize) % self.tips.len();
        self.tips.get(index)
    }

    /// Foods that help with `term`, matched against the food name and its
    /// good-for list.
    pub fn nutrition_for(&self, term: &str) -> Vec<&NutritionInfo> {
        let term = term.to_lowercase();
        self.nutrition
            .iter()
            .filter(|info| {
                info.food_item.to_lowercase().contains(&term) ||
                    info.good_for.iter().any(|g| g.to_lowercase().contains(&term))
            })
            .collect()
    }

    pub fn nutrition(&self) -> &[NutritionInfo] {
        &self.nutrition
    }

    pub fn emergency_contacts(&self) -> &[EmergencyContact] {
        &self.emergency_contacts
    }
}
