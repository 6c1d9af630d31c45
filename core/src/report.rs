//! Import of plain-text food journal reports.
//!
//! A report is a sequence of days, each opened by a `Date:` line and followed
//! by item lines in one of three shapes:
//!
//! ```text
//! Date: May 24, 2025
//! Meal 1:
//! - Egg x1 (1g)
//! - BBQ Pork Rinds 14g (1g)
//! - Simple Entry (75g)
//! Daily Total: 77g carbs
//! ```
//!
//! Parsing never fails on individual lines: anything unrecognized is skipped.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::error::{JournalError, Result};
use crate::models::{DailyEntry, LineItem};

static DATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Date:\s*(.+)$").expect("date line pattern is valid"));

static SKIPPED_LINES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"^Meal \d+:$", r"^Total:", r"^Daily Total:"]
        .iter()
        .map(|p| Regex::new(p).expect("skipped line pattern is valid"))
        .collect()
});

/// Accepted spellings of the `Date:` value, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

struct ItemMatcher {
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures<'_>) -> Option<LineItem>,
}

fn item_name(caps: &Captures<'_>) -> String {
    caps[1].trim().to_lowercase()
}

fn explicit_quantity(caps: &Captures<'_>) -> Option<LineItem> {
    let qty: f64 = caps[2].parse().ok()?;
    let carbs: f64 = caps[3].parse().ok()?;
    Some(LineItem {
        qty: qty.to_string(),
        item: item_name(caps),
        carbs,
    })
}

fn single_serving(caps: &Captures<'_>) -> Option<LineItem> {
    let carbs: f64 = caps[2].parse().ok()?;
    Some(LineItem {
        qty: "1".to_string(),
        item: item_name(caps),
        carbs,
    })
}

static ITEM_MATCHERS: LazyLock<Vec<ItemMatcher>> = LazyLock::new(|| {
    let specs: [(&'static str, &str, fn(&Captures<'_>) -> Option<LineItem>); 3] = [
        (
            "explicit quantity",
            r"^-\s*(.+?)\s+x(\d+(?:\.\d+)?)\s*\((\d+(?:\.\d+)?)g\)$",
            explicit_quantity,
        ),
        (
            "single serving",
            r"^-\s*(.+?)\s*\((\d+(?:\.\d+)?)g\)$",
            single_serving,
        ),
        (
            "weighted",
            r"^-\s*(.+?)\s+\d+(?:\.\d+)?g\s*\((\d+(?:\.\d+)?)g\)$",
            single_serving,
        ),
    ];
    specs
        .into_iter()
        .map(|(name, pattern, build)| ItemMatcher {
            name,
            pattern: Regex::new(pattern).expect("item pattern is valid"),
            build,
        })
        .collect()
});

/// Parse the value of a `Date:` line. A leading weekday ("Saturday, ") is
/// ignored.
#[must_use]
pub fn parse_report_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let try_formats = |s: &str| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    };
    try_formats(value).or_else(|| {
        let (_, rest) = value.split_once(',')?;
        try_formats(rest.trim())
    })
}

/// Match one line against the item shapes; first match wins.
#[must_use]
pub fn parse_item_line(line: &str) -> Option<LineItem> {
    ITEM_MATCHERS.iter().find_map(|m| {
        let caps = m.pattern.captures(line)?;
        let item = (m.build)(&caps)?;
        tracing::debug!("Matched {} item: {} x{}", m.name, item.item, item.qty);
        Some(item)
    })
}

#[derive(Debug, Default)]
enum ParseState {
    #[default]
    NoCurrentDate,
    AccumulatingDay {
        date: NaiveDate,
        items: Vec<LineItem>,
    },
}

/// Line-at-a-time report state machine.
#[derive(Debug, Default)]
pub struct ReportParser {
    state: ParseState,
}

impl ReportParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a completed day when the line closes one.
    pub fn feed_line(&mut self, line: &str) -> Option<DailyEntry> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(caps) = DATE_LINE.captures(line) {
            let finished = self.flush();
            match parse_report_date(caps[1].trim()) {
                Some(date) => {
                    self.state = ParseState::AccumulatingDay {
                        date,
                        items: Vec::new(),
                    };
                }
                None => tracing::warn!("Ignoring unparseable date line: '{line}'"),
            }
            return finished;
        }

        if SKIPPED_LINES.iter().any(|re| re.is_match(line)) {
            return None;
        }

        match (&mut self.state, parse_item_line(line)) {
            (ParseState::AccumulatingDay { items, .. }, Some(item)) => items.push(item),
            (ParseState::NoCurrentDate, Some(_)) => {
                tracing::debug!("Skipping item before any date: '{line}'");
            }
            (_, None) => tracing::debug!("Skipping unrecognized line: '{line}'"),
        }
        None
    }

    /// End of input: hand back the day still being accumulated, if any.
    #[must_use]
    pub fn finish(self) -> Option<DailyEntry> {
        self.flush()
    }

    /// Snapshot of the current day. The state is left alone, so a day whose
    /// next `Date:` line is unreadable keeps accumulating and is flushed again.
    fn flush(&self) -> Option<DailyEntry> {
        match &self.state {
            ParseState::AccumulatingDay { date, items } if !items.is_empty() => {
                Some(DailyEntry::from_items(*date, items.clone()))
            }
            ParseState::AccumulatingDay { .. } | ParseState::NoCurrentDate => None,
        }
    }
}

/// Parse a whole report, handing each completed day to `on_day` as soon as
/// it is closed. Returns the number of days handed over.
///
/// Blank input is an error; input without any importable day is not.
pub fn parse_report<F>(text: &str, mut on_day: F) -> Result<usize>
where
    F: FnMut(DailyEntry) -> Result<()>,
{
    if text.trim().is_empty() {
        return Err(JournalError::NoDataToImport);
    }

    let mut parser = ReportParser::new();
    let mut days = 0;
    for line in text.lines() {
        if let Some(entry) = parser.feed_line(line) {
            on_day(entry)?;
            days += 1;
        }
    }
    if let Some(entry) = parser.finish() {
        on_day(entry)?;
        days += 1;
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_report_entries(text: &str) -> Result<Vec<DailyEntry>> {
        let mut entries = Vec::new();
        parse_report(text, |entry| {
            entries.push(entry);
            Ok(())
        })?;
        Ok(entries)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE_REPORT: &str = "\
Date: May 24, 2025
Meal 1:
- Egg x1 (1g)
- Cottage Cheese x2 (10g)
Daily Total: 11g carbs
";

    #[test]
    fn test_parse_sample_report() {
        let entries = parse_report_entries(SAMPLE_REPORT).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.date, date(2025, 5, 24));
        let first = &entry.meals[0];
        assert_eq!(first.section, "Brunch");
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].item, "egg");
        assert_eq!(first.items[0].qty, "1");
        assert!((first.items[0].carbs - 1.0).abs() < f64::EPSILON);
        assert_eq!(first.items[1].item, "cottage cheese");
        assert_eq!(first.items[1].qty, "2");
        assert!((first.items[1].carbs - 10.0).abs() < f64::EPSILON);
        assert!((first.total - 11.0).abs() < f64::EPSILON);

        for section in &entry.meals[1..] {
            assert_eq!(section.items.len(), 1);
            assert!(section.items[0].is_placeholder());
        }
        assert!(entry.notes.is_empty());
    }

    #[test]
    fn test_parse_report_counts_days() {
        let mut seen = Vec::new();
        let count = parse_report(SAMPLE_REPORT, |e| {
            seen.push(e.date);
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(seen, vec![date(2025, 5, 24)]);
    }

    #[test]
    fn test_parse_all_item_formats() {
        let text = "\
Date: 2025-05-25
- Egg x1.5 (1.5g)
- BBQ Pork Rinds 14g (1g)
- Simple Entry (75g)
";
        let entries = parse_report_entries(text).unwrap();
        let items = &entries[0].meals[0].items;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].qty, "1.5");
        assert_eq!(items[1].item, "bbq pork rinds 14g");
        assert_eq!(items[1].qty, "1");
        assert!((items[1].carbs - 1.0).abs() < f64::EPSILON);
        assert_eq!(items[2].item, "simple entry");
        assert!((items[2].carbs - 75.0).abs() < f64::EPSILON);
        assert!((entries[0].meals[0].total - 77.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_multiple_days() {
        let text = "\
Date: May 24, 2025
- Egg x1 (1g)
Total: 1g
Date: Sunday, May 25, 2025
Meal 1:
- Toast x2 (30g)
Meal 2:
- Apple (25g)
Daily Total: 55g carbs
";
        let entries = parse_report_entries(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date(2025, 5, 24));
        assert_eq!(entries[1].date, date(2025, 5, 25));
        assert_eq!(entries[1].meals[0].items.len(), 2);
        assert!((entries[1].meals[0].total - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_without_items_is_not_flushed() {
        let text = "\
Date: May 23, 2025
Meal 1:
Date: May 24, 2025
- Egg x1 (1g)
";
        let entries = parse_report_entries(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, date(2025, 5, 24));
    }

    #[test]
    fn test_bad_date_keeps_prior_context() {
        let text = "\
Date: May 24, 2025
- Egg x1 (1g)
Date: someday soon
- Toast x1 (15g)
";
        let entries = parse_report_entries(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date(2025, 5, 24));
        assert_eq!(entries[0].meals[0].items.len(), 1);
        assert_eq!(entries[1].date, date(2025, 5, 24));
        assert_eq!(entries[1].meals[0].items.len(), 2);
        assert_eq!(entries[1].meals[0].items[1].item, "toast");
    }

    #[test]
    fn test_bare_form_wins_over_weighted() {
        let item = parse_item_line("- Rice 200g (45g)").unwrap();
        assert_eq!(item.item, "rice 200g");
        assert_eq!(item.qty, "1");
        assert!((item.carbs - 45.0).abs() < f64::EPSILON);

        let item = parse_item_line("- Cheese x2 (2g)").unwrap();
        assert_eq!(item.item, "cheese");
        assert_eq!(item.qty, "2");
    }

    #[test]
    fn test_items_before_first_date_are_ignored() {
        let text = "\
- Egg x1 (1g)
Date: May 24, 2025
- Toast x1 (15g)
";
        let entries = parse_report_entries(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meals[0].items.len(), 1);
        assert_eq!(entries[0].meals[0].items[0].item, "toast");
    }

    #[test]
    fn test_nothing_importable() {
        let text = "just some words\n- not an item\nTotal: 5g\n";
        let count = parse_report(text, |_| Ok(())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_blank_input_is_error() {
        assert!(matches!(
            parse_report("  \n\n ", |_| Ok(())),
            Err(JournalError::NoDataToImport)
        ));
    }

    #[test]
    fn test_sink_error_aborts() {
        let result = parse_report(SAMPLE_REPORT, |_| Err(JournalError::NoItemsToSave));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_report_date_forms() {
        let expected = date(2025, 5, 24);
        for s in [
            "2025-05-24",
            "May 24, 2025",
            "May 24 2025",
            "Saturday, May 24, 2025",
            "24 May 2025",
            "5/24/2025",
            "Sat, May 24, 2025",
        ] {
            assert_eq!(parse_report_date(s), Some(expected), "{s}");
        }
        assert_eq!(parse_report_date("not a date"), None);
        assert_eq!(parse_report_date("May 32, 2025"), None);
    }

    #[test]
    fn test_parse_item_line_rejects_other_shapes() {
        assert!(parse_item_line("Egg x1 (1g)").is_none());
        assert!(parse_item_line("- Egg x1").is_none());
        assert!(parse_item_line("- Egg (1 g)").is_none());
    }

    #[test]
    fn test_windows_line_endings() {
        let text = "Date: May 24, 2025\r\n- Egg x1 (1g)\r\n";
        let entries = parse_report_entries(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meals[0].items[0].item, "egg");
    }
}
