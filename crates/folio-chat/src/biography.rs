//! Biography Store - immutable structured profile data backing all answers.
//!
//! Loading never fails past this boundary: a broken or missing data file
//! degrades to a hardcoded minimal record with the same shape.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default record bundled with the crate, used when no path is configured.
const BUNDLED_RECORD: &str = include_str!("../data/biography.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiographyRecord {
    pub personal: PersonalInfo,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    #[serde(default)]
    pub nickname: String,
    pub title: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub communication_style: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub program: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// One named skill category, e.g. "frontend.frameworks" -> ["React", ...].
/// Categories keep their declaration order from the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl BiographyRecord {
    /// Minimal hardcoded record used when neither the configured file nor
    /// the bundled default can be read. Shape over content: every field is
    /// present, collections may be empty.
    pub fn minimal() -> Self {
        Self {
            personal: PersonalInfo {
                name: "Alex Reyes".to_string(),
                nickname: "Rey".to_string(),
                title: "Full Stack Developer".to_string(),
                bio: "Full stack developer passionate about modern web applications".to_string(),
                location: "Based in the United States".to_string(),
                communication_style: vec!["friendly".to_string(), "clear".to_string()],
                interests: vec!["Web development".to_string()],
                languages: vec!["English".to_string()],
                education: Vec::new(),
            },
            skills: vec![
                SkillGroup {
                    category: "frontend.frameworks".to_string(),
                    items: vec!["React".to_string(), "Vue.js".to_string()],
                },
                SkillGroup {
                    category: "backend.runtime".to_string(),
                    items: vec!["Node.js".to_string()],
                },
            ],
            experience: Vec::new(),
            projects: Vec::new(),
            faq: Vec::new(),
        }
    }

    /// Parse the record bundled with the crate.
    fn bundled() -> Option<Self> {
        match serde_json::from_str(BUNDLED_RECORD) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(error = %e, "Bundled biography record failed to parse");
                None
            }
        }
    }
}

/// Owns the loaded record. Read-only after construction; freely shared.
#[derive(Debug, Clone)]
pub struct BiographyStore {
    record: BiographyRecord,
    degraded: bool,
}

impl BiographyStore {
    /// Load the record from `path`, or the bundled default when no path is
    /// given. Any failure degrades to the minimal record; this operation
    /// never returns an error.
    pub fn load(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match read_record(path) {
                Ok(record) => {
                    tracing::info!(path = %path.display(), "Biography record loaded");
                    return Self { record, degraded: false };
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Biography load failed, degrading to default record");
                    return Self {
                        record: BiographyRecord::bundled().unwrap_or_else(BiographyRecord::minimal),
                        degraded: true,
                    };
                }
            }
        }

        match BiographyRecord::bundled() {
            Some(record) => Self { record, degraded: false },
            None => Self { record: BiographyRecord::minimal(), degraded: true },
        }
    }

    pub fn from_record(record: BiographyRecord) -> Self {
        Self { record, degraded: false }
    }

    pub fn record(&self) -> &BiographyRecord {
        &self.record
    }

    /// True when the configured data source could not be used and the store
    /// substituted a default record.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

fn read_record(path: &Path) -> Result<BiographyRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading biography data from {}", path.display()))?;
    let record = serde_json::from_str(&content)
        .with_context(|| format!("parsing biography data from {}", path.display()))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_record_parses() {
        let store = BiographyStore::load(None);
        assert!(!store.is_degraded());
        assert!(!store.record().personal.name.is_empty());
        assert!(!store.record().skills.is_empty());
    }

    #[test]
    fn missing_file_degrades_instead_of_failing() {
        let store = BiographyStore::load(Some(Path::new("/nonexistent/biography.json")));
        assert!(store.is_degraded());
        // Shape contract still holds
        assert!(!store.record().personal.name.is_empty());
        assert!(!store.record().personal.title.is_empty());
    }

    #[test]
    fn minimal_record_has_required_fields() {
        let record = BiographyRecord::minimal();
        assert!(!record.personal.name.is_empty());
        assert!(!record.personal.title.is_empty());
        assert!(record.experience.is_empty());
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{
            "personal": {"name": "Jo Doe", "title": "Engineer"},
            "skills": [{"category": "tools", "items": ["Git"]}]
        }"#;
        let record: BiographyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.personal.nickname, "");
        assert!(record.faq.is_empty());
        assert!(record.projects.is_empty());
    }
}
