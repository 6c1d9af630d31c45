use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::{compute_line_carbs, extract_carbs};
use crate::error::{JournalError, Result};
use crate::foods::FoodTable;

/// The four fixed meal slots of a day, in display order.
pub const SECTION_LABELS: [&str; 4] = ["Brunch", "Snack", "Dinner", "Evening Snack"];

/// Default daily carbohydrate limit in grams.
pub const DEFAULT_DAILY_LIMIT_G: f64 = 100.0;

/// Store key prefix shared by every journal document.
pub const KEY_PREFIX: &str = "food-journal-";
pub const CUSTOM_FOODS_KEY: &str = "food-journal-custom-foods";
pub const CUSTOM_TEMPLATES_KEY: &str = "food-journal-custom-templates";

/// Store key for a day's entry: `food-journal-2025-05-24`.
#[must_use]
pub fn entry_key(date: NaiveDate) -> String {
    format!("{KEY_PREFIX}{}", date.format("%Y-%m-%d"))
}

/// Inverse of [`entry_key`]. Custom food/template keys yield `None`.
#[must_use]
pub fn date_from_key(key: &str) -> Option<NaiveDate> {
    let rest = key.strip_prefix(KEY_PREFIX)?;
    NaiveDate::parse_from_str(rest, "%Y-%m-%d").ok()
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| JournalError::InvalidDate(s.to_string()))
}

/// Resolve a user-supplied section name ("brunch", "Evening Snack",
/// "evening-snack", "4") to its index in [`SECTION_LABELS`].
pub fn section_index(name: &str) -> Result<usize> {
    let normalized = name.trim().to_lowercase().replace(['-', '_'], " ");
    if let Ok(n) = normalized.parse::<usize>() {
        if (1..=SECTION_LABELS.len()).contains(&n) {
            return Ok(n - 1);
        }
    }
    let index = match normalized.as_str() {
        "evening" => Some(3),
        other => SECTION_LABELS
            .iter()
            .position(|label| label.to_lowercase() == other),
    };
    index.ok_or_else(|| JournalError::InvalidSection(name.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub qty: String,
    pub item: String,
    pub carbs: f64,
}

impl LineItem {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            qty: String::new(),
            item: String::new(),
            carbs: 0.0,
        }
    }

    /// A line item whose carbs are computed from the food table.
    #[must_use]
    pub fn computed(foods: &FoodTable, qty: &str, item: &str) -> Self {
        Self {
            qty: qty.to_string(),
            item: item.to_string(),
            carbs: compute_line_carbs(foods, item, qty),
        }
    }

    /// Both fields blank.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.qty.trim().is_empty() && self.item.trim().is_empty()
    }

    /// Both fields filled in, the condition for saving into a template.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.qty.trim().is_empty() && !self.item.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSection {
    pub section: String,
    pub items: Vec<LineItem>,
    pub total: f64,
}

impl MealSection {
    #[must_use]
    pub fn empty(label: &str) -> Self {
        Self {
            section: label.to_string(),
            items: vec![LineItem::placeholder()],
            total: 0.0,
        }
    }

    pub fn recompute_total(&mut self) {
        self.total = self.items.iter().map(|i| i.carbs).sum();
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut LineItem> {
        let section = self.section.clone();
        self.items
            .get_mut(row)
            .ok_or(JournalError::InvalidRow { section, row })
    }

    pub fn set_item_food(&mut self, foods: &FoodTable, row: usize, food: &str) -> Result<()> {
        let item = self.row_mut(row)?;
        item.item = food.to_string();
        item.carbs = compute_line_carbs(foods, &item.item, &item.qty);
        self.recompute_total();
        Ok(())
    }

    pub fn set_item_qty(&mut self, foods: &FoodTable, row: usize, qty: &str) -> Result<()> {
        let item = self.row_mut(row)?;
        item.qty = qty.to_string();
        item.carbs = compute_line_carbs(foods, &item.item, &item.qty);
        self.recompute_total();
        Ok(())
    }

    /// Append an empty row.
    pub fn add_item(&mut self) {
        self.items.push(LineItem::placeholder());
    }

    /// Remove a row. The last remaining row is never removed; returns whether
    /// anything changed.
    pub fn remove_item(&mut self, row: usize) -> Result<bool> {
        if row >= self.items.len() {
            return Err(JournalError::InvalidRow {
                section: self.section.clone(),
                row,
            });
        }
        if self.items.len() <= 1 {
            return Ok(false);
        }
        self.items.remove(row);
        self.recompute_total();
        Ok(true)
    }

    /// Fill the first empty row, or append when every row is in use.
    pub fn add_line(&mut self, foods: &FoodTable, qty: &str, food: &str) -> usize {
        let line = LineItem::computed(foods, qty, food);
        let row = if let Some(row) = self.items.iter().position(LineItem::is_placeholder) {
            self.items[row] = line;
            row
        } else {
            self.items.push(line);
            self.items.len() - 1
        };
        self.recompute_total();
        row
    }

    /// Re-run the calculator over every row, e.g. after the food table changed.
    pub fn recompute(&mut self, foods: &FoodTable) {
        for item in &mut self.items {
            item.carbs = compute_line_carbs(foods, &item.item, &item.qty);
        }
        self.recompute_total();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub meals: Vec<MealSection>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl DailyEntry {
    /// Four empty sections and no notes.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            meals: SECTION_LABELS.iter().map(|l| MealSection::empty(l)).collect(),
            notes: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// An imported day: every item in the first section, placeholders in the
    /// other three.
    #[must_use]
    pub fn from_items(date: NaiveDate, items: Vec<LineItem>) -> Self {
        let mut entry = Self::empty(date);
        if !items.is_empty() {
            let first = &mut entry.meals[0];
            first.items = items;
            first.recompute_total();
        }
        entry
    }

    /// Restore the fixed four-section layout on documents that lost it.
    ///
    /// Sections are matched by label; missing ones are added empty, extra ones
    /// dropped, empty item lists get a placeholder.
    pub fn ensure_sections(&mut self) {
        let mut existing = std::mem::take(&mut self.meals);
        self.meals = SECTION_LABELS
            .iter()
            .map(|label| {
                let found = existing
                    .iter()
                    .position(|m| m.section.eq_ignore_ascii_case(label))
                    .map(|i| existing.remove(i));
                let mut section = found.unwrap_or_else(|| MealSection::empty(label));
                section.section = (*label).to_string();
                if section.items.is_empty() {
                    section.items.push(LineItem::placeholder());
                }
                section.recompute_total();
                section
            })
            .collect();
    }

    pub fn section_mut(&mut self, index: usize) -> Result<&mut MealSection> {
        self.meals
            .get_mut(index)
            .ok_or_else(|| JournalError::InvalidSection(index.to_string()))
    }

    /// True when no section has a filled-in row and there are no notes.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.notes.trim().is_empty()
            && self
                .meals
                .iter()
                .all(|m| m.items.iter().all(LineItem::is_placeholder))
    }

    #[must_use]
    pub fn meals_total(&self) -> f64 {
        self.meals.iter().map(|m| m.total).sum()
    }

    #[must_use]
    pub fn notes_carbs(&self) -> f64 {
        extract_carbs(&self.notes)
    }

    /// Section totals plus carbs mentioned in the notes.
    #[must_use]
    pub fn total_carbs(&self) -> f64 {
        self.meals_total() + self.notes_carbs()
    }

    pub fn touch(&mut self) {
        self.timestamp = Utc::now();
    }
}

/// Where a day stands against the daily limit.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub sections: Vec<SectionSummary>,
    pub notes_carbs: f64,
    pub total_carbs: f64,
    pub daily_limit: f64,
    /// Negative when over the limit.
    pub remaining: f64,
    pub over_limit: bool,
    pub percent_of_limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub section: String,
    pub total: f64,
    pub items: usize,
}

impl DaySummary {
    #[must_use]
    pub fn build(entry: &DailyEntry, daily_limit: f64) -> Self {
        let total_carbs = entry.total_carbs();
        let remaining = daily_limit - total_carbs;
        let percent_of_limit = if daily_limit > 0.0 {
            (total_carbs / daily_limit * 100.0).round() as i64
        } else {
            0
        };
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            sections: entry
                .meals
                .iter()
                .map(|m| SectionSummary {
                    section: m.section.clone(),
                    total: m.total,
                    items: m.items.iter().filter(|i| !i.is_placeholder()).count(),
                })
                .collect(),
            notes_carbs: entry.notes_carbs(),
            total_carbs,
            daily_limit,
            remaining,
            over_limit: total_carbs > daily_limit,
            percent_of_limit,
        }
    }
}

// --- Templates ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl TemplateCategory {
    /// Category whose templates are offered for a section: brunch →
    /// breakfast, dinner → dinner, anything else → snacks.
    #[must_use]
    pub fn for_section(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("brunch") {
            Self::Breakfast
        } else if lower.contains("dinner") {
            Self::Dinner
        } else {
            Self::Snacks
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snacks => "snacks",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" | "snacks" => Ok(Self::Snacks),
            _ => Err(JournalError::InvalidCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealTemplate {
    pub name: String,
    pub items: Vec<LineItem>,
    pub total_carbs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TemplateCategory>,
}

pub type CustomTemplates = BTreeMap<TemplateCategory, Vec<MealTemplate>>;

// --- Backup ---

/// Everything needed to rebuild a journal on another machine.
///
/// Decoded member by member in `backup::deserialize_backup`, so one bad
/// member never sinks the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub export_date: DateTime<Utc>,
    pub custom_foods: BTreeMap<String, f64>,
    pub custom_templates: CustomTemplates,
    pub daily_entries: BTreeMap<String, DailyEntry>,
    /// Days that did not decode; restored verbatim under their key.
    #[serde(skip)]
    pub unreadable_entries: BTreeMap<String, serde_json::Value>,
}

/// Counts reported after restoring a backup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub days_imported: usize,
    pub foods_imported: usize,
    pub templates_imported: usize,
}

/// Counts reported after importing a text report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportImportSummary {
    pub days_imported: usize,
    pub items_imported: usize,
    pub dates: Vec<String>,
}
