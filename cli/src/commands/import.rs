use std::path::Path;

use anyhow::Result;

use carbjournal_core::{JournalError, JournalService};

use super::helpers::read_input;

pub(crate) fn cmd_import_report(svc: &JournalService, path: &Path, json: bool) -> Result<()> {
    let text = read_input(path)?;

    let summary = match svc.import_report(&text) {
        Ok(summary) => summary,
        Err(JournalError::NoDataToImport) => {
            if json {
                println!("{}", serde_json::json!({ "error": "No data to import" }));
            } else {
                eprintln!("No data to import.");
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.days_imported == 0 {
        println!("No valid data found. Check the report format:");
        println!("  Date: May 24, 2025");
        println!("  - Egg x1 (1g)");
    } else {
        println!("Import complete.\n");
        println!("  Days imported:  {}", summary.days_imported);
        println!("  Items imported: {}", summary.items_imported);
        println!("  Dates:          {}", summary.dates.join(", "));
    }

    Ok(())
}

pub(crate) fn cmd_import_backup(svc: &mut JournalService, path: &Path, json: bool) -> Result<()> {
    let text = read_input(path)?;
    let summary = svc.restore_backup(&text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Backup restored.\n");
        println!("  Days:      {}", summary.days_imported);
        println!("  Foods:     {}", summary.foods_imported);
        println!("  Templates: {}", summary.templates_imported);
    }

    Ok(())
}
