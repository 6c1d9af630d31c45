use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use carbjournal_core::foods::{FoodEntry, FoodSource};
use carbjournal_core::models::{DailyEntry, DaySummary, LineItem};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// One-based row number from the command line to a zero-based index.
pub(crate) fn parse_row(row: usize) -> Result<usize> {
    if row == 0 {
        bail!("Row numbers start at 1");
    }
    Ok(row - 1)
}

/// Read a whole file, or stdin for `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `12g`, `7.5g`
pub(crate) fn grams(v: f64) -> String {
    let v = no_neg_zero(v);
    if v.fract() == 0.0 {
        format!("{v:.0}g")
    } else {
        format!("{v:.1}g")
    }
}

/// `[2] 1 × toast: 15g`
fn format_item_row(row: usize, item: &LineItem) -> String {
    let qty = if item.qty.trim().is_empty() { "?" } else { item.qty.trim() };
    let name = if item.item.trim().is_empty() { "?" } else { item.item.trim() };
    format!("[{row}] {qty} × {name}: {}", grams(item.carbs))
}

pub(crate) fn print_day(entry: &DailyEntry, summary: &DaySummary) {
    let date = &summary.date;
    println!("=== {date} ===\n");

    for meal in &entry.meals {
        let label = meal.section.to_uppercase();
        println!("  {label} ({})", grams(meal.total));
        let mut any = false;
        for (i, item) in meal.items.iter().enumerate() {
            if item.is_placeholder() {
                continue;
            }
            any = true;
            println!("    {}", format_item_row(i + 1, item));
        }
        if !any {
            println!("    (empty)");
        }
    }

    if !entry.notes.trim().is_empty() {
        let notes = entry.notes.trim();
        println!("\n  NOTES: {notes} (+{})", grams(summary.notes_carbs));
    }

    let total = grams(summary.total_carbs);
    let limit = grams(summary.daily_limit);
    let pct = summary.percent_of_limit;
    println!("\n  TOTAL: {total} of {limit} ({pct}%)");
    if summary.over_limit {
        println!("  OVER LIMIT BY: {}", grams(-summary.remaining));
    } else {
        println!("  REMAINING: {}", grams(summary.remaining));
    }
}

pub(crate) fn print_food_table(foods: &[FoodEntry]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Carbs/unit")]
        carbs: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            name: truncate(&f.name, 35),
            carbs: grams(f.carbs_per_unit),
            source: match (f.source, f.shadows_builtin) {
                (FoodSource::Builtin, _) => "built-in".to_string(),
                (FoodSource::Custom, false) => "custom".to_string(),
                (FoodSource::Custom, true) => "custom (overrides built-in)".to_string(),
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
