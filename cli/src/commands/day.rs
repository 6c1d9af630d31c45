use anyhow::Result;
use chrono::Local;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use carbjournal_core::JournalService;
use carbjournal_core::models::{DailyEntry, DaySummary};

use super::helpers::{grams, parse_date, parse_row, print_day};

fn print_entry(svc: &JournalService, entry: &DailyEntry, json: bool) -> Result<()> {
    let summary = DaySummary::build(entry, svc.daily_limit());
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "entry": entry,
                "summary": summary,
            }))?
        );
    } else {
        print_day(entry, &summary);
    }
    Ok(())
}

pub(crate) fn cmd_show(svc: &JournalService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let entry = svc.load_day(date)?;

    if entry.is_blank() && !json {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    print_entry(svc, &entry, json)
}

pub(crate) fn cmd_history(svc: &JournalService, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Limit")]
        limit: String,
        #[tabled(rename = "%")]
        percent: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let today = Local::now().date_naive();
    let summaries = svc.history(today, days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = summaries
        .iter()
        .map(|s| HistoryRow {
            date: s.date.clone(),
            carbs: grams(s.total_carbs),
            limit: grams(s.daily_limit),
            percent: format!("{}%", s.percent_of_limit),
            status: if s.over_limit {
                format!("over by {}", grams(-s.remaining))
            } else {
                format!("{} left", grams(s.remaining))
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_add(
    svc: &JournalService,
    section: &str,
    qty: &str,
    food: &[String],
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let food = food.join(" ");
    let entry = svc.add_line(date, section, qty, &food)?;

    if !json {
        let carbs = svc.line_carbs(&food, qty);
        if svc.resolve_food(&food).is_none() {
            eprintln!("Note: '{food}' is not in the food table, counted as 0g");
            let suggestions = svc.suggest(&food);
            if !suggestions.is_empty() {
                eprintln!("Did you mean: {}", suggestions.join(", "));
            }
        }
        println!("Added {qty} × {food} ({})\n", grams(carbs));
    }
    print_entry(svc, &entry, json)
}

pub(crate) fn cmd_set(
    svc: &JournalService,
    section: &str,
    row: usize,
    qty: Option<&str>,
    food: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if qty.is_none() && food.is_none() {
        anyhow::bail!("Nothing to change. Pass --qty and/or --food");
    }
    let date = parse_date(date)?;
    let entry = svc.set_item(date, section, parse_row(row)?, qty, food)?;
    print_entry(svc, &entry, json)
}

pub(crate) fn cmd_remove(
    svc: &JournalService,
    section: &str,
    row: usize,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let removed = svc.remove_item(date, section, parse_row(row)?)?;

    if json {
        let entry = svc.load_day(date)?;
        println!(
            "{}",
            serde_json::json!({ "removed": removed, "entry": entry })
        );
    } else if removed {
        println!("Removed row {row}");
    } else {
        println!("Row {row} is the only row in {section}; left in place");
    }
    Ok(())
}

pub(crate) fn cmd_notes(
    svc: &JournalService,
    notes: &[String],
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let entry = svc.set_notes(date, &notes.join(" "))?;
    print_entry(svc, &entry, json)
}

pub(crate) fn cmd_clear(svc: &JournalService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let cleared = svc.clear_day(date)?;

    if json {
        println!("{}", serde_json::json!({ "date": date, "cleared": cleared }));
        return Ok(());
    }
    if !cleared {
        eprintln!("No entries for {date}");
        process::exit(2);
    }
    println!("Cleared {date}");
    Ok(())
}
