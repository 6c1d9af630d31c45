use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::backup::{deserialize_backup, serialize_backup};
use crate::calc::compute_line_carbs;
use crate::db::{Database, EntryRepository, SETTING_LAST_BACKUP_AT, SETTING_LAST_WRITE_AT};
use crate::error::{JournalError, Result};
use crate::foods::{FoodEntry, FoodTable, parse_food_input};
use crate::models::{
    BackupDocument, DEFAULT_DAILY_LIMIT_G, DailyEntry, DaySummary, MealTemplate,
    ReportImportSummary, RestoreSummary, SECTION_LABELS, TemplateCategory, date_from_key,
    section_index,
};
use crate::report::parse_report;
use crate::templates::{OfferedTemplate, TemplateBook, apply_template};

/// Default age of the last backup before a reminder is due.
pub const DEFAULT_BACKUP_REMINDER_MINUTES: i64 = 10;

/// Whether recent edits are covered by a backup.
#[derive(Debug, Clone, Serialize)]
pub struct BackupStatus {
    pub last_write_at: Option<DateTime<Utc>>,
    pub last_backup_at: Option<DateTime<Utc>>,
    pub reminder_due: bool,
}

impl BackupStatus {
    /// A reminder is due when something was written after the last backup
    /// and that backup is older than `threshold`, or when nothing written was
    /// ever backed up.
    #[must_use]
    pub fn evaluate(
        last_write_at: Option<DateTime<Utc>>,
        last_backup_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Self {
        let reminder_due = match (last_write_at, last_backup_at) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(write), Some(backup)) => write > backup && now - backup >= threshold,
        };
        Self {
            last_write_at,
            last_backup_at,
            reminder_due,
        }
    }
}

/// Templates offered for one section of a day.
#[derive(Debug, Clone, Serialize)]
pub struct SectionTemplates {
    pub section: String,
    pub category: TemplateCategory,
    pub templates: Vec<OfferedTemplate>,
}

pub struct JournalService {
    db: Database,
    foods: FoodTable,
    templates: TemplateBook,
    daily_limit: f64,
}

impl JournalService {
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::from_database(Database::open(db_path)?)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::from_database(Database::open_in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self> {
        let foods = FoodTable::with_custom(db.load_custom_foods()?);
        let templates = TemplateBook::new(db.load_custom_templates()?);
        Ok(Self {
            db,
            foods,
            templates,
            daily_limit: DEFAULT_DAILY_LIMIT_G,
        })
    }

    #[must_use]
    pub fn with_daily_limit(mut self, daily_limit: f64) -> Self {
        self.daily_limit = daily_limit;
        self
    }

    #[must_use]
    pub fn daily_limit(&self) -> f64 {
        self.daily_limit
    }

    #[must_use]
    pub fn foods(&self) -> &FoodTable {
        &self.foods
    }

    // --- Days ---

    /// The stored entry for `date`, or an empty day.
    pub fn load_day(&self, date: NaiveDate) -> Result<DailyEntry> {
        Ok(self
            .db
            .get(date)?
            .unwrap_or_else(|| DailyEntry::empty(date)))
    }

    pub fn save_day(&self, entry: &mut DailyEntry) -> Result<()> {
        entry.touch();
        self.db.put(entry.date, entry)
    }

    fn edit_day<F>(&self, date: NaiveDate, edit: F) -> Result<DailyEntry>
    where
        F: FnOnce(&mut DailyEntry, &FoodTable) -> Result<()>,
    {
        let mut entry = self.load_day(date)?;
        edit(&mut entry, &self.foods)?;
        self.save_day(&mut entry)?;
        Ok(entry)
    }

    /// Log `qty` of `food` into a section, filling its first empty row.
    pub fn add_line(
        &self,
        date: NaiveDate,
        section: &str,
        qty: &str,
        food: &str,
    ) -> Result<DailyEntry> {
        let index = section_index(section)?;
        self.edit_day(date, |entry, foods| {
            let row = entry.section_mut(index)?.add_line(foods, qty, food);
            tracing::debug!(
                "Logged '{food}' x{qty} in {} row {}",
                SECTION_LABELS[index],
                row + 1
            );
            Ok(())
        })
    }

    /// Edit one row (zero-based). Either field may be left unchanged.
    pub fn set_item(
        &self,
        date: NaiveDate,
        section: &str,
        row: usize,
        qty: Option<&str>,
        food: Option<&str>,
    ) -> Result<DailyEntry> {
        let index = section_index(section)?;
        self.edit_day(date, |entry, foods| {
            let meal = entry.section_mut(index)?;
            if let Some(food) = food {
                meal.set_item_food(foods, row, food)?;
            }
            if let Some(qty) = qty {
                meal.set_item_qty(foods, row, qty)?;
            }
            Ok(())
        })
    }

    /// Append an empty row to a section.
    pub fn add_row(&self, date: NaiveDate, section: &str) -> Result<DailyEntry> {
        let index = section_index(section)?;
        self.edit_day(date, |entry, _| {
            entry.section_mut(index)?.add_item();
            Ok(())
        })
    }

    /// Remove a row (zero-based). Returns false when it was the section's
    /// only row, in which case nothing is written.
    pub fn remove_item(&self, date: NaiveDate, section: &str, row: usize) -> Result<bool> {
        let index = section_index(section)?;
        let mut entry = self.load_day(date)?;
        let removed = entry.section_mut(index)?.remove_item(row)?;
        if removed {
            self.save_day(&mut entry)?;
        }
        Ok(removed)
    }

    pub fn set_notes(&self, date: NaiveDate, notes: &str) -> Result<DailyEntry> {
        self.edit_day(date, |entry, _| {
            entry.notes = notes.to_string();
            Ok(())
        })
    }

    /// Forget everything stored for a day.
    pub fn clear_day(&self, date: NaiveDate) -> Result<bool> {
        let cleared = self.db.delete(date)?;
        if cleared {
            tracing::info!("Cleared {date}");
        }
        Ok(cleared)
    }

    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        let entry = self.load_day(date)?;
        Ok(DaySummary::build(&entry, self.daily_limit))
    }

    /// Summaries of stored days in the `days` days ending at `today`,
    /// newest first.
    pub fn history(&self, today: NaiveDate, days: u32) -> Result<Vec<DaySummary>> {
        let earliest = today - Duration::days(i64::from(days.saturating_sub(1)));
        let mut summaries: Vec<DaySummary> = self
            .db
            .list_all()?
            .values()
            .filter(|e| e.date >= earliest && e.date <= today)
            .map(|e| DaySummary::build(e, self.daily_limit))
            .collect();
        summaries.reverse();
        Ok(summaries)
    }

    // --- Foods ---

    /// Add a custom food from `"name carbs"` input and persist it.
    pub fn add_food(&mut self, input: &str) -> Result<(String, f64)> {
        let (name, carbs) = parse_food_input(input)?;
        self.upsert_food(&name, carbs)?;
        Ok((name, carbs))
    }

    pub fn upsert_food(&mut self, name: &str, carbs_per_unit: f64) -> Result<()> {
        self.foods.upsert(name, carbs_per_unit)?;
        self.db.save_custom_foods(self.foods.custom_foods())?;
        tracing::info!("Saved custom food '{name}' ({carbs_per_unit}g)");
        Ok(())
    }

    pub fn remove_food(&mut self, name: &str) -> Result<bool> {
        if !self.foods.remove(name) {
            return Ok(false);
        }
        self.db.save_custom_foods(self.foods.custom_foods())?;
        Ok(true)
    }

    /// Custom foods only, or the whole merged table.
    #[must_use]
    pub fn list_foods(&self, include_builtin: bool) -> Vec<FoodEntry> {
        self.foods
            .entries()
            .into_iter()
            .filter(|e| include_builtin || e.source == crate::foods::FoodSource::Custom)
            .collect()
    }

    #[must_use]
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        self.foods.suggest(prefix)
    }

    #[must_use]
    pub fn resolve_food(&self, name: &str) -> Option<f64> {
        self.foods.resolve(name)
    }

    #[must_use]
    pub fn line_carbs(&self, food: &str, qty: &str) -> f64 {
        compute_line_carbs(&self.foods, food, qty)
    }

    // --- Templates ---

    pub fn templates_for_section(&self, section: &str) -> Result<SectionTemplates> {
        let label = SECTION_LABELS[section_index(section)?];
        Ok(SectionTemplates {
            section: label.to_string(),
            category: TemplateCategory::for_section(label),
            templates: self.templates.templates_for_section(label),
        })
    }

    /// Apply the `number`th (one-based) template offered for a section.
    pub fn apply_template(
        &self,
        date: NaiveDate,
        section: &str,
        number: usize,
    ) -> Result<(DailyEntry, MealTemplate)> {
        let offered = self.templates_for_section(section)?;
        let template = number
            .checked_sub(1)
            .and_then(|i| offered.templates.get(i))
            .map(|o| o.template.clone())
            .ok_or_else(|| JournalError::TemplateNotFound {
                category: offered.category.to_string(),
                index: number,
            })?;
        let index = section_index(section)?;
        let entry = self.edit_day(date, |entry, foods| {
            apply_template(entry.section_mut(index)?, &template, foods);
            Ok(())
        })?;
        tracing::info!("Applied template '{}' to {}", template.name, offered.section);
        Ok((entry, template))
    }

    /// Save a section's filled-in rows as a custom template.
    pub fn save_template(
        &mut self,
        date: NaiveDate,
        section: &str,
        name: &str,
    ) -> Result<MealTemplate> {
        let index = section_index(section)?;
        let entry = self.load_day(date)?;
        let saved = self
            .templates
            .save_from_section(&entry.meals[index], name)?
            .clone();
        self.db.save_custom_templates(self.templates.custom())?;
        Ok(saved)
    }

    /// Remove the `number`th (one-based) custom template of a category.
    pub fn remove_template(&mut self, category: &str, number: usize) -> Result<MealTemplate> {
        let category: TemplateCategory = category.parse()?;
        let index = number
            .checked_sub(1)
            .ok_or_else(|| JournalError::TemplateNotFound {
                category: category.to_string(),
                index: number,
            })?;
        let removed = self
            .templates
            .remove(category, index)
            .map_err(|_| JournalError::TemplateNotFound {
                category: category.to_string(),
                index: number,
            })?;
        self.db.save_custom_templates(self.templates.custom())?;
        tracing::info!("Removed template '{}' from {category}", removed.name);
        Ok(removed)
    }

    #[must_use]
    pub fn custom_templates(&self) -> &crate::models::CustomTemplates {
        self.templates.custom()
    }

    // --- Import / export ---

    /// Import a text report. Each day is written as soon as it is parsed,
    /// replacing whatever was stored for that date.
    pub fn import_report(&self, text: &str) -> Result<ReportImportSummary> {
        let mut summary = ReportImportSummary::default();
        parse_report(text, |mut entry| {
            summary.items_imported += entry.meals[0].items.len();
            summary.dates.push(entry.date.format("%Y-%m-%d").to_string());
            self.save_day(&mut entry)
        })?;
        summary.days_imported = summary.dates.len();
        tracing::info!(
            "Imported {} days ({} items) from report",
            summary.days_imported,
            summary.items_imported
        );
        Ok(summary)
    }

    /// Snapshot of the whole journal.
    pub fn backup_document(&self) -> Result<BackupDocument> {
        Ok(BackupDocument::new(
            Utc::now(),
            self.foods.custom_foods().clone(),
            self.templates.custom().clone(),
            self.db.list_all()?,
        ))
    }

    /// Serialize a backup and record that one was taken.
    pub fn export_backup(&self) -> Result<String> {
        let document = self.backup_document()?;
        let text = serialize_backup(&document)?;
        self.db
            .set_timestamp(SETTING_LAST_BACKUP_AT, document.export_date)?;
        tracing::info!(
            "Exported backup with {} days",
            document.daily_entries.len()
        );
        Ok(text)
    }

    /// Merge a backup into the journal: days overwrite by date, foods by
    /// name, templates are appended.
    pub fn restore_backup(&mut self, text: &str) -> Result<RestoreSummary> {
        let document = deserialize_backup(text)?;
        let mut summary = RestoreSummary::default();

        for (key, entry) in &document.daily_entries {
            match date_from_key(key) {
                Some(date) => {
                    let mut entry = entry.clone();
                    entry.date = date;
                    entry.ensure_sections();
                    self.db.put(date, &entry)?;
                }
                None => {
                    tracing::warn!("Storing backup entry under unrecognized key '{key}'");
                    self.db.put_raw(key, &serde_json::to_string(entry)?)?;
                }
            }
            summary.days_imported += 1;
        }

        for (key, value) in &document.unreadable_entries {
            tracing::warn!("Storing unreadable backup entry '{key}' as is");
            self.db.put_raw(key, &value.to_string())?;
            summary.days_imported += 1;
        }

        if !document.custom_foods.is_empty() {
            summary.foods_imported = self.foods.merge(&document.custom_foods);
            self.db.save_custom_foods(self.foods.custom_foods())?;
        }

        if document.template_count() > 0 {
            summary.templates_imported = self.templates.append(&document.custom_templates);
            self.db.save_custom_templates(self.templates.custom())?;
        }

        tracing::info!(
            "Restored {} days, {} foods, {} templates",
            summary.days_imported,
            summary.foods_imported,
            summary.templates_imported
        );
        Ok(summary)
    }

    pub fn backup_status(&self, now: DateTime<Utc>, threshold: Duration) -> Result<BackupStatus> {
        Ok(BackupStatus::evaluate(
            self.db.get_timestamp(SETTING_LAST_WRITE_AT)?,
            self.db.get_timestamp(SETTING_LAST_BACKUP_AT)?,
            now,
            threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const REPORT: &str = "\
Date: May 24, 2025
Meal 1:
- Egg x1 (1g)
- Cottage Cheese x2 (10g)
Daily Total: 11g carbs
";

    #[test]
    fn test_load_missing_day_is_empty() {
        let svc = JournalService::new_in_memory().unwrap();
        let entry = svc.load_day(date(2025, 5, 24)).unwrap();
        assert!(entry.is_blank());
        assert_eq!(entry.meals.len(), 4);
    }

    #[test]
    fn test_add_line_persists() {
        let svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        svc.add_line(d, "brunch", "2", "toast").unwrap();
        svc.add_line(d, "brunch", "1", "banana").unwrap();
        let entry = svc.load_day(d).unwrap();
        assert_eq!(entry.meals[0].items.len(), 2);
        assert!((entry.meals[0].total - 57.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_line_invalid_section() {
        let svc = JournalService::new_in_memory().unwrap();
        let result = svc.add_line(date(2025, 5, 24), "lunch", "1", "toast");
        assert!(matches!(result, Err(JournalError::InvalidSection(_))));
    }

    #[test]
    fn test_set_item_and_remove() {
        let svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        svc.add_line(d, "dinner", "1", "rice").unwrap();
        svc.add_line(d, "dinner", "1", "broccoli").unwrap();

        let entry = svc.set_item(d, "dinner", 0, Some("2"), None).unwrap();
        assert!((entry.meals[2].total - 96.0).abs() < f64::EPSILON);

        let entry = svc
            .set_item(d, "dinner", 1, None, Some("quinoa"))
            .unwrap();
        assert!((entry.meals[2].total - 129.0).abs() < f64::EPSILON);

        assert!(svc.remove_item(d, "dinner", 0).unwrap());
        assert!(!svc.remove_item(d, "dinner", 0).unwrap());
        let entry = svc.load_day(d).unwrap();
        assert_eq!(entry.meals[2].items[0].item, "quinoa");
        assert!(svc.set_item(d, "dinner", 4, Some("1"), None).is_err());
    }

    #[test]
    fn test_add_row() {
        let svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        let entry = svc.add_row(d, "snack").unwrap();
        assert_eq!(entry.meals[1].items.len(), 2);
    }

    #[test]
    fn test_notes_count_toward_summary() {
        let svc = JournalService::new_in_memory()
            .unwrap()
            .with_daily_limit(50.0);
        let d = date(2025, 5, 24);
        svc.add_line(d, "snack", "1", "apple").unwrap();
        svc.set_notes(d, "juice 30g").unwrap();
        let summary = svc.day_summary(d).unwrap();
        assert!((summary.total_carbs - 55.0).abs() < f64::EPSILON);
        assert!((summary.notes_carbs - 30.0).abs() < f64::EPSILON);
        assert!(summary.over_limit);
        assert_eq!(summary.percent_of_limit, 110);
    }

    #[test]
    fn test_clear_day() {
        let svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        svc.add_line(d, "snack", "1", "apple").unwrap();
        assert!(svc.clear_day(d).unwrap());
        assert!(!svc.clear_day(d).unwrap());
        assert!(svc.load_day(d).unwrap().is_blank());
    }

    #[test]
    fn test_history_window() {
        let svc = JournalService::new_in_memory().unwrap();
        for day in [10, 20, 22, 24] {
            svc.add_line(date(2025, 5, day), "snack", "1", "apple")
                .unwrap();
        }
        let history = svc.history(date(2025, 5, 24), 7).unwrap();
        let dates: Vec<&str> = history.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-05-24", "2025-05-22", "2025-05-20"]);

        let history = svc.history(date(2025, 5, 24), 1).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_custom_food_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        {
            let mut svc = JournalService::new(&path).unwrap();
            let (name, carbs) = svc.add_food("Raccoon Soup 20").unwrap();
            assert_eq!(name, "raccoon soup");
            assert!((carbs - 20.0).abs() < f64::EPSILON);
        }
        let svc = JournalService::new(&path).unwrap();
        assert_eq!(svc.resolve_food("raccoon soup"), Some(20.0));
        assert!((svc.line_carbs("raccoon soup", "2") - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_food_shadows_and_removes() {
        let mut svc = JournalService::new_in_memory().unwrap();
        svc.upsert_food("toast", 12.0).unwrap();
        assert_eq!(svc.resolve_food("toast"), Some(12.0));
        assert_eq!(svc.list_foods(false).len(), 1);
        assert!(svc.list_foods(true).len() > svc.list_foods(false).len());

        assert!(svc.remove_food("toast").unwrap());
        assert!(!svc.remove_food("toast").unwrap());
        assert_eq!(svc.resolve_food("toast"), Some(15.0));
    }

    #[test]
    fn test_add_food_rejects_bad_input() {
        let mut svc = JournalService::new_in_memory().unwrap();
        assert!(matches!(
            svc.add_food("soup"),
            Err(JournalError::InvalidFoodInput(_))
        ));
        assert!(svc.list_foods(false).is_empty());
    }

    #[test]
    fn test_template_save_apply_remove() {
        let mut svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        svc.add_line(d, "evening snack", "1", "nuts").unwrap();
        svc.add_line(d, "evening snack", "1", "cheese").unwrap();

        let saved = svc.save_template(d, "evening snack", "Night bite").unwrap();
        assert_eq!(saved.name, "🍽️ Night bite");
        assert_eq!(saved.items.len(), 2);
        assert!((saved.total_carbs - 7.0).abs() < f64::EPSILON);

        let offered = svc.templates_for_section("snack").unwrap();
        assert_eq!(offered.category, TemplateCategory::Snacks);
        let last = offered.templates.len();
        assert_eq!(offered.templates[last - 1].template.name, "🍽️ Night bite");

        let other = date(2025, 5, 25);
        let (entry, applied) = svc.apply_template(other, "snack", last).unwrap();
        assert_eq!(applied.name, "🍽️ Night bite");
        assert_eq!(entry.meals[1].items.len(), 2);
        assert!((entry.meals[1].total - 7.0).abs() < f64::EPSILON);

        let removed = svc.remove_template("snacks", 1).unwrap();
        assert_eq!(removed.name, "🍽️ Night bite");
        assert!(svc.custom_templates().is_empty());
        assert!(matches!(
            svc.remove_template("snacks", 1),
            Err(JournalError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_save_template_from_empty_section() {
        let mut svc = JournalService::new_in_memory().unwrap();
        assert!(matches!(
            svc.save_template(date(2025, 5, 24), "dinner", "Nothing"),
            Err(JournalError::NoItemsToSave)
        ));
    }

    #[test]
    fn test_apply_template_out_of_range() {
        let svc = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        assert!(svc.apply_template(d, "brunch", 0).is_err());
        assert!(svc.apply_template(d, "brunch", 999).is_err());
        assert!(svc.load_day(d).unwrap().is_blank());
    }

    #[test]
    fn test_import_report() {
        let svc = JournalService::new_in_memory().unwrap();
        let summary = svc.import_report(REPORT).unwrap();
        assert_eq!(summary.days_imported, 1);
        assert_eq!(summary.items_imported, 2);
        assert_eq!(summary.dates, vec!["2025-05-24"]);

        let entry = svc.load_day(date(2025, 5, 24)).unwrap();
        assert_eq!(entry.meals[0].items[0].item, "egg");
        assert!((entry.meals[0].total - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_import_report_without_data_changes_nothing() {
        let svc = JournalService::new_in_memory().unwrap();
        let summary = svc.import_report("hello\nworld\n").unwrap();
        assert_eq!(summary.days_imported, 0);
        assert!(svc.backup_document().unwrap().daily_entries.is_empty());
        assert!(matches!(
            svc.import_report(""),
            Err(JournalError::NoDataToImport)
        ));
    }

    #[test]
    fn test_export_and_restore_roundtrip() {
        let mut source = JournalService::new_in_memory().unwrap();
        let d = date(2025, 5, 24);
        source.upsert_food("raccoon soup", 20.0).unwrap();
        source.add_line(d, "dinner", "1", "raccoon soup").unwrap();
        source.set_notes(d, "cookie 8g").unwrap();
        source.save_template(d, "dinner", "Soup night").unwrap();
        let text = source.export_backup().unwrap();

        let mut target = JournalService::new_in_memory().unwrap();
        let summary = target.restore_backup(&text).unwrap();
        assert_eq!(
            summary,
            RestoreSummary {
                days_imported: 1,
                foods_imported: 1,
                templates_imported: 1,
            }
        );
        assert_eq!(target.load_day(d).unwrap(), source.load_day(d).unwrap());
        assert_eq!(target.resolve_food("raccoon soup"), Some(20.0));
        assert_eq!(target.custom_templates(), source.custom_templates());
    }

    #[test]
    fn test_restore_merges_with_existing() {
        let mut svc = JournalService::new_in_memory().unwrap();
        svc.upsert_food("possum pie", 101.0).unwrap();
        svc.upsert_food("raccoon soup", 5.0).unwrap();
        let text = r#"{
            "exportDate": "2025-05-24T00:00:00Z",
            "customFoods": {"raccoon soup": 20},
            "dailyEntries": {}
        }"#;
        let summary = svc.restore_backup(text).unwrap();
        assert_eq!(summary.days_imported, 0);
        assert_eq!(summary.foods_imported, 1);
        assert_eq!(svc.resolve_food("raccoon soup"), Some(20.0));
        assert_eq!(svc.resolve_food("possum pie"), Some(101.0));
    }

    #[test]
    fn test_restore_rejects_invalid_backup() {
        let mut svc = JournalService::new_in_memory().unwrap();
        assert!(matches!(
            svc.restore_backup(r#"{"customFoods": {}}"#),
            Err(JournalError::InvalidBackupFormat(_))
        ));
    }

    #[test]
    fn test_restore_keeps_going_past_bad_members() {
        let mut svc = JournalService::new_in_memory().unwrap();
        let text = r#"{
            "dailyEntries": {
                "food-journal-2025-05-24": {
                    "date": "2025-05-24",
                    "meals": [{"section": "Brunch", "items": [{"qty": "1", "item": "egg", "carbs": 1}], "total": 1}],
                    "notes": "tea 3g"
                },
                "food-journal-2025-05-25": {"meals": "broken"}
            },
            "customFoods": {"raccoon soup": 20},
            "customTemplates": {
                "snacks": [{"name": "Nuts", "items": [{"qty": "1", "item": "nuts", "carbs": 6}], "totalCarbs": 6}],
                "elevenses": [{"name": "Tea", "items": [], "totalCarbs": 0}]
            }
        }"#;
        let summary = svc.restore_backup(text).unwrap();
        assert_eq!(
            summary,
            RestoreSummary {
                days_imported: 2,
                foods_imported: 1,
                templates_imported: 1,
            }
        );

        let good = svc.load_day(date(2025, 5, 24)).unwrap();
        assert_eq!(good.notes, "tea 3g");
        assert_eq!(good.meals.len(), 4);
        assert_eq!(
            svc.db.get_raw("food-journal-2025-05-25").unwrap().as_deref(),
            Some(r#"{"meals":"broken"}"#)
        );
        assert!(svc.load_day(date(2025, 5, 25)).unwrap().is_blank());
        assert_eq!(svc.resolve_food("raccoon soup"), Some(20.0));
    }

    #[test]
    fn test_backup_status_tracks_writes_and_exports() {
        let svc = JournalService::new_in_memory().unwrap();
        let threshold = Duration::minutes(DEFAULT_BACKUP_REMINDER_MINUTES);
        assert!(!svc.backup_status(Utc::now(), threshold).unwrap().reminder_due);

        svc.add_line(date(2025, 5, 24), "snack", "1", "apple")
            .unwrap();
        assert!(svc.backup_status(Utc::now(), threshold).unwrap().reminder_due);

        svc.export_backup().unwrap();
        let status = svc.backup_status(Utc::now(), threshold).unwrap();
        assert!(status.last_backup_at.is_some());
        assert!(!status.reminder_due);
    }

    #[test]
    fn test_backup_status_evaluate() {
        let now = Utc::now();
        let threshold = Duration::minutes(10);
        let old = now - Duration::minutes(30);
        let recent = now - Duration::minutes(2);

        assert!(!BackupStatus::evaluate(None, None, now, threshold).reminder_due);
        assert!(BackupStatus::evaluate(Some(recent), None, now, threshold).reminder_due);
        assert!(BackupStatus::evaluate(Some(recent), Some(old), now, threshold).reminder_due);
        assert!(!BackupStatus::evaluate(Some(old), Some(recent), now, threshold).reminder_due);
        assert!(
            !BackupStatus::evaluate(Some(now), Some(recent), now, threshold).reminder_due
        );
    }
}
