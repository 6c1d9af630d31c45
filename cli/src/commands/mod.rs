mod day;
mod export;
mod food;
mod helpers;
mod import;
mod template;

use anyhow::Result;
use chrono::{Duration, Utc};

use carbjournal_core::JournalService;

use crate::config::Config;

pub(crate) use day::{cmd_add, cmd_clear, cmd_history, cmd_notes, cmd_remove, cmd_set, cmd_show};
pub(crate) use export::{cmd_export, cmd_status};
pub(crate) use food::{cmd_food_add, cmd_food_carbs, cmd_food_list, cmd_food_remove, cmd_food_suggest};
pub(crate) use helpers::json_error;
pub(crate) use import::{cmd_import_backup, cmd_import_report};
pub(crate) use template::{
    cmd_template_apply, cmd_template_list, cmd_template_remove, cmd_template_save,
};

/// Nudge towards `export` after a write when the last backup is stale.
pub(crate) fn remind_backup(svc: &JournalService, config: &Config) -> Result<()> {
    let threshold = Duration::minutes(config.backup_reminder_minutes);
    let status = svc.backup_status(Utc::now(), threshold)?;
    if status.reminder_due {
        eprintln!("\nTip: you have changes that are not in a backup. Run `carbjournal export`.");
    }
    Ok(())
}
