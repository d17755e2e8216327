//! Career catalog record definition.
//!
//! Every field has a defined default applied at load time, so downstream code
//! never sees a missing value: text fields default to `""`, the salary to `0.0`.

use serde::{Deserialize, Deserializer, Serialize};

/// One career entry. `title` is the stable natural key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    #[serde(alias = "career_title", deserialize_with = "text_or_empty")]
    pub title: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub description: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub skills: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub personality_match: String,
    #[serde(alias = "education_requirement", deserialize_with = "text_or_empty")]
    pub education_required: String,
    #[serde(alias = "average_salary_usd", deserialize_with = "number_or_zero")]
    pub average_salary: f64,
    #[serde(deserialize_with = "text_or_empty")]
    pub job_outlook: String,
    /// Opaque blob handed through to callers. Structured source values are kept
    /// as their compact JSON text.
    #[serde(deserialize_with = "text_or_empty")]
    pub learning_resources: String,
}

impl CatalogItem {
    /// Embedding input: description, skills and personality match joined by a
    /// single space, always in that order.
    pub fn combined_text(&self) -> String {
        [
            self.description.as_str(),
            self.skills.as_str(),
            self.personality_match.as_str(),
        ]
        .join(" ")
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if n.is_finite() { n } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_text_order_is_fixed() {
        let item = CatalogItem {
            title: "Data Scientist".into(),
            description: "Builds models".into(),
            skills: "Python, SQL".into(),
            personality_match: "Analytical".into(),
            ..Default::default()
        };
        assert_eq!(item.combined_text(), "Builds models Python, SQL Analytical");
    }

    #[test]
    fn missing_fields_default() {
        let item: CatalogItem = serde_json::from_str(r#"{"title": "Curator"}"#).unwrap();
        assert_eq!(item.title, "Curator");
        assert_eq!(item.description, "");
        assert_eq!(item.average_salary, 0.0);
        assert_eq!(item.combined_text(), "  ");
    }

    #[test]
    fn source_aliases_and_nulls() {
        let json = r#"{
            "career_title": "Animator",
            "education_requirement": "Bachelor's",
            "average_salary_usd": null,
            "skills": null,
            "learning_resources": {"courses": ["Blender Basics"]}
        }"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.title, "Animator");
        assert_eq!(item.education_required, "Bachelor's");
        assert_eq!(item.average_salary, 0.0);
        assert_eq!(item.skills, "");
        assert_eq!(item.learning_resources, r#"{"courses":["Blender Basics"]}"#);
    }

    #[test]
    fn salary_accepts_numeric_strings() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"title": "Pharmacist", "average_salary": "128000"}"#)
                .unwrap();
        assert_eq!(item.average_salary, 128_000.0);

        let item: CatalogItem =
            serde_json::from_str(r#"{"title": "Pharmacist", "average_salary": "n/a"}"#).unwrap();
        assert_eq!(item.average_salary, 0.0);
    }
}
