use anyhow::Result;
use std::process;

use carbjournal_core::JournalService;
use carbjournal_core::models::{DaySummary, SECTION_LABELS};
use carbjournal_core::service::SectionTemplates;

use super::helpers::{grams, parse_date, print_day};

fn print_offered(offered: &SectionTemplates) {
    let section = &offered.section;
    let category = offered.category;
    println!("  {} ({category})", section.to_uppercase());
    for (i, o) in offered.templates.iter().enumerate() {
        let n = i + 1;
        let t = &o.template;
        let items = t
            .items
            .iter()
            .map(|item| format!("{} {}", item.qty, item.item))
            .collect::<Vec<_>>()
            .join(", ");
        let custom = o
            .custom_index
            .map(|c| format!(" [custom #{}]", c + 1))
            .unwrap_or_default();
        println!(
            "    {n:>2}. {}: {}{custom}\n        {items}",
            t.name,
            grams(t.total_carbs)
        );
    }
    println!();
}

pub(crate) fn cmd_template_list(
    svc: &JournalService,
    section: Option<&str>,
    json: bool,
) -> Result<()> {
    let offered = match section {
        Some(s) => vec![svc.templates_for_section(s)?],
        None => SECTION_LABELS
            .iter()
            .map(|label| svc.templates_for_section(label))
            .collect::<carbjournal_core::Result<Vec<_>>>()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&offered)?);
        return Ok(());
    }
    for o in &offered {
        print_offered(o);
    }
    Ok(())
}

pub(crate) fn cmd_template_apply(
    svc: &JournalService,
    section: &str,
    number: usize,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let (entry, template) = svc.apply_template(date, section, number)?;

    if json {
        let summary = DaySummary::build(&entry, svc.daily_limit());
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "template": template,
                "entry": entry,
                "summary": summary,
            }))?
        );
    } else {
        println!("Applied '{}'\n", template.name);
        print_day(&entry, &DaySummary::build(&entry, svc.daily_limit()));
    }
    Ok(())
}

pub(crate) fn cmd_template_save(
    svc: &mut JournalService,
    section: &str,
    name: &[String],
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let template = svc.save_template(date, section, &name.join(" "))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&template)?);
    } else {
        let category = template
            .category
            .map(|c| c.to_string())
            .unwrap_or_default();
        println!(
            "Saved template '{}' ({} items, {}) under {category}",
            template.name,
            template.items.len(),
            grams(template.total_carbs)
        );
    }
    Ok(())
}

pub(crate) fn cmd_template_remove(
    svc: &mut JournalService,
    category: &str,
    number: usize,
    json: bool,
) -> Result<()> {
    let removed = svc.remove_template(category, number);

    match (removed, json) {
        (Ok(template), true) => println!("{}", serde_json::to_string_pretty(&template)?),
        (Ok(template), false) => println!("Removed template '{}'", template.name),
        (Err(carbjournal_core::JournalError::TemplateNotFound { .. }), false) => {
            eprintln!("No custom template #{number} in '{category}'");
            process::exit(2);
        }
        (Err(e), _) => return Err(e.into()),
    }
    Ok(())
}
