use anyhow::Result;
use std::process;

use carbjournal_core::JournalService;

use super::helpers::{grams, print_food_table};

pub(crate) fn cmd_food_add(svc: &mut JournalService, input: &[String], json: bool) -> Result<()> {
    let input = input.join(" ");
    let (name, carbs) = svc.add_food(&input)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "carbs_per_unit": carbs })
        );
    } else {
        println!("Added food: {name} ({} per unit)", grams(carbs));
    }
    Ok(())
}

pub(crate) fn cmd_food_remove(svc: &mut JournalService, name: &[String], json: bool) -> Result<()> {
    let name = name.join(" ");
    let removed = svc.remove_food(&name)?;

    if json {
        println!("{}", serde_json::json!({ "name": name, "removed": removed }));
        return Ok(());
    }
    if !removed {
        eprintln!("No custom food named '{name}'");
        process::exit(2);
    }
    match svc.resolve_food(&name) {
        Some(carbs) => println!(
            "Removed custom food: {name} (built-in value {} is back)",
            grams(carbs)
        ),
        None => println!("Removed custom food: {name}"),
    }
    Ok(())
}

pub(crate) fn cmd_food_list(svc: &JournalService, all: bool, json: bool) -> Result<()> {
    let foods = svc.list_foods(all);

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }
    if foods.is_empty() {
        eprintln!("No custom foods yet. Add one with: carbjournal food add raccoon soup 20");
        process::exit(2);
    }
    print_food_table(&foods);
    Ok(())
}

pub(crate) fn cmd_food_suggest(svc: &JournalService, prefix: &[String], json: bool) -> Result<()> {
    let prefix = prefix.join(" ");
    let suggestions = svc.suggest(&prefix);

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }
    if suggestions.is_empty() {
        eprintln!("No foods start with '{prefix}'");
        process::exit(2);
    }
    for name in &suggestions {
        println!("{name}");
    }
    Ok(())
}

pub(crate) fn cmd_food_carbs(
    svc: &JournalService,
    qty: &str,
    food: &[String],
    json: bool,
) -> Result<()> {
    let food = food.join(" ");
    let per_unit = svc.resolve_food(&food);
    let carbs = svc.line_carbs(&food, qty);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "food": food,
                "qty": qty,
                "carbs_per_unit": per_unit,
                "carbs": carbs,
            })
        );
        return Ok(());
    }
    let Some(per_unit) = per_unit else {
        eprintln!("Unknown food '{food}'");
        process::exit(2);
    };
    println!(
        "{qty} × {food} = {} ({} per unit)",
        grams(carbs),
        grams(per_unit)
    );
    Ok(())
}
