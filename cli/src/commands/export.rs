use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Local, Utc};

use carbjournal_core::JournalService;
use carbjournal_core::backup::backup_file_name;

use crate::config::Config;

pub(crate) fn cmd_export(
    svc: &JournalService,
    config: &Config,
    out: Option<&Path>,
    stdout: bool,
    json: bool,
) -> Result<()> {
    let text = svc.export_backup()?;

    if stdout {
        println!("{text}");
        return Ok(());
    }

    let dir: PathBuf = match out {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => config.ensure_backup_dir()?.to_path_buf(),
    };
    let path = dir.join(backup_file_name(Local::now().date_naive()));
    std::fs::write(&path, &text)
        .with_context(|| format!("Failed to write backup: {}", path.display()))?;

    if json {
        println!("{}", serde_json::json!({ "path": path, "bytes": text.len() }));
    } else {
        println!("Backup written to {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_status(svc: &JournalService, config: &Config, json: bool) -> Result<()> {
    let threshold = Duration::minutes(config.backup_reminder_minutes);
    let status = svc.backup_status(Utc::now(), threshold)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "db_path": config.db_path,
                "backup_dir": config.backup_dir,
                "daily_limit": svc.daily_limit(),
                "custom_foods": svc.foods().custom_foods().len(),
                "backup": status,
            }))?
        );
        return Ok(());
    }

    let fmt = |t: Option<chrono::DateTime<Utc>>| {
        t.map_or_else(
            || "never".to_string(),
            |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        )
    };
    println!("  Database:     {}", config.db_path.display());
    println!("  Backups:      {}", config.backup_dir.display());
    println!("  Daily limit:  {}g", svc.daily_limit());
    println!("  Custom foods: {}", svc.foods().custom_foods().len());
    println!("  Last change:  {}", fmt(status.last_write_at));
    println!("  Last backup:  {}", fmt(status.last_backup_at));
    if status.reminder_due {
        println!("\n  Backup recommended: run `carbjournal export`");
    }
    Ok(())
}
