//! Whole-journal backup documents.
//!
//! The document is pretty-printed JSON:
//!
//! ```json
//! {
//!   "exportDate": "2025-05-24T18:02:11Z",
//!   "customFoods": { "raccoon soup": 20.0 },
//!   "customTemplates": { "snacks": [ ... ] },
//!   "dailyEntries": { "food-journal-2025-05-24": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::error::{JournalError, Result};
use crate::models::{BackupDocument, CustomTemplates, DailyEntry, MealTemplate, TemplateCategory};

const EXPORT_DATE_FIELD: &str = "exportDate";
const CUSTOM_FOODS_FIELD: &str = "customFoods";
const CUSTOM_TEMPLATES_FIELD: &str = "customTemplates";
const DAILY_ENTRIES_FIELD: &str = "dailyEntries";

impl BackupDocument {
    #[must_use]
    pub fn new(
        export_date: DateTime<Utc>,
        custom_foods: BTreeMap<String, f64>,
        custom_templates: CustomTemplates,
        daily_entries: BTreeMap<String, DailyEntry>,
    ) -> Self {
        Self {
            export_date,
            custom_foods,
            custom_templates,
            daily_entries,
            unreadable_entries: BTreeMap::new(),
        }
    }

    /// Number of custom templates across every category.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.custom_templates.values().map(Vec::len).sum()
    }
}

/// Encode a backup as pretty-printed JSON.
pub fn serialize_backup(document: &BackupDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Decode a backup. Only non-JSON input and a missing `dailyEntries` object
/// are rejected; any other unreadable member is skipped with a warning.
pub fn deserialize_backup(text: &str) -> Result<BackupDocument> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| JournalError::InvalidBackupFormat(format!("not JSON: {e}")))?;

    let Value::Object(mut fields) = value else {
        return Err(JournalError::InvalidBackupFormat(
            "expected a JSON object".to_string(),
        ));
    };
    let Some(Value::Object(entries)) = fields.remove(DAILY_ENTRIES_FIELD) else {
        return Err(JournalError::InvalidBackupFormat(format!(
            "missing {DAILY_ENTRIES_FIELD}"
        )));
    };

    let export_date = fields
        .remove(EXPORT_DATE_FIELD)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_else(Utc::now);
    let mut document = BackupDocument::new(
        export_date,
        BTreeMap::new(),
        CustomTemplates::new(),
        BTreeMap::new(),
    );

    for (key, value) in entries {
        match serde_json::from_value::<DailyEntry>(value.clone()) {
            Ok(entry) => {
                document.daily_entries.insert(key, entry);
            }
            Err(e) => {
                tracing::warn!("Backup entry '{key}' is unreadable, keeping it as is: {e}");
                document.unreadable_entries.insert(key, value);
            }
        }
    }

    if let Some(Value::Object(foods)) = fields.remove(CUSTOM_FOODS_FIELD) {
        for (name, carbs) in foods {
            match carbs.as_f64() {
                Some(carbs) => {
                    document.custom_foods.insert(name, carbs);
                }
                None => tracing::warn!("Skipping backup food '{name}': {carbs} is not a number"),
            }
        }
    }

    if let Some(Value::Object(templates)) = fields.remove(CUSTOM_TEMPLATES_FIELD) {
        document.custom_templates = decode_templates(templates);
    }

    Ok(document)
}

fn decode_templates(templates: Map<String, Value>) -> CustomTemplates {
    let mut decoded = CustomTemplates::new();
    for (category, list) in templates {
        let Ok(parsed) = category.parse::<TemplateCategory>() else {
            tracing::warn!("Skipping templates in unknown category '{category}'");
            continue;
        };
        let Value::Array(list) = list else {
            tracing::warn!("Skipping templates in '{category}': not a list");
            continue;
        };
        for template in list {
            match serde_json::from_value::<MealTemplate>(template) {
                Ok(template) => decoded.entry(parsed).or_default().push(template),
                Err(e) => tracing::warn!("Skipping unreadable template in '{category}': {e}"),
            }
        }
    }
    decoded
}

/// `food-journal-backup-2025-05-24.json`
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("food-journal-backup-{}.json", date.format("%Y-%m-%d"))
}
