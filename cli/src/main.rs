mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::{
    cmd_add, cmd_clear, cmd_export, cmd_food_add, cmd_food_carbs, cmd_food_list, cmd_food_remove,
    cmd_food_suggest, cmd_history, cmd_import_backup, cmd_import_report, cmd_notes, cmd_remove,
    cmd_set, cmd_show, cmd_status, cmd_template_apply, cmd_template_list, cmd_template_remove,
    cmd_template_save, json_error, remind_backup,
};
use crate::config::Config;
use carbjournal_core::JournalService;

#[derive(Parser)]
#[command(
    name = "carbjournal",
    version,
    about = "A simple, local-first carbohydrate journal",
    long_about = "Log what you eat in four daily sections (Brunch, Snack, Dinner, \
                  Evening Snack), see carbs against a daily limit, and keep \
                  backups of everything."
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a day's journal (defaults to today)
    Show {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
    },
    /// Show carb totals for the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
    /// Log a food into a section
    Add {
        /// Section: brunch, snack, dinner, evening-snack (or 1-4)
        section: String,
        /// Quantity (number of units)
        qty: String,
        /// Food name
        #[arg(required = true, num_args = 1..)]
        food: Vec<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Change the quantity or food of a row
    Set {
        /// Section: brunch, snack, dinner, evening-snack (or 1-4)
        section: String,
        /// Row number as shown by `show`
        row: usize,
        /// New quantity
        #[arg(short, long)]
        qty: Option<String>,
        /// New food name
        #[arg(short, long)]
        food: Option<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a row from a section
    Remove {
        /// Section: brunch, snack, dinner, evening-snack (or 1-4)
        section: String,
        /// Row number as shown by `show`
        row: usize,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Replace the day's notes; carbs written as "15g" count toward the total
    Notes {
        /// Notes text
        #[arg(num_args = 0..)]
        text: Vec<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete everything stored for a day
    Clear {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Manage the food table
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Browse, apply and save meal templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Import a text report or a backup file
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Write a full backup
    Export {
        /// Directory to write to (default: the data directory's backups/)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print the backup instead of writing a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },
    /// Show storage locations and backup status
    Status,
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add or replace a custom food, e.g. `food add raccoon soup 20`
    Add {
        /// Food name followed by carbs per unit
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },
    /// Remove a custom food
    Remove {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// List custom foods
    List {
        /// Include built-in foods
        #[arg(short, long)]
        all: bool,
    },
    /// Suggest food names starting with a prefix
    Suggest {
        #[arg(required = true, num_args = 1..)]
        prefix: Vec<String>,
    },
    /// Carbs for a quantity of a food
    Carbs {
        /// Quantity (number of units)
        qty: String,
        /// Food name
        #[arg(required = true, num_args = 1..)]
        food: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates offered for a section (default: all sections)
    List {
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Add a template's items to a section
    Apply {
        /// Section: brunch, snack, dinner, evening-snack (or 1-4)
        section: String,
        /// Template number as shown by `template list`
        number: usize,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Save a section's rows as a custom template
    Save {
        /// Section: brunch, snack, dinner, evening-snack (or 1-4)
        section: String,
        /// Template name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a custom template
    Remove {
        /// Category: breakfast, lunch, dinner, snacks
        category: String,
        /// Custom template number within the category
        number: usize,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import days from a text report (use - for stdin)
    Report { file: PathBuf },
    /// Restore a backup file, merging it into the journal
    Backup { file: PathBuf },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            println!("{}", json_error(&format!("{e:#}")));
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!("Using journal at {}", config.db_path.display());
    let mut svc = JournalService::new(&config.db_path)?.with_daily_limit(config.daily_limit);
    let json = cli.json;

    let writes = match cli.command {
        Commands::Show { date } => cmd_show(&svc, date, json).map(|()| false),
        Commands::History { days } => cmd_history(&svc, days, json).map(|()| false),
        Commands::Add {
            section,
            qty,
            food,
            date,
        } => cmd_add(&svc, &section, &qty, &food, date, json).map(|()| true),
        Commands::Set {
            section,
            row,
            qty,
            food,
            date,
        } => cmd_set(
            &svc,
            &section,
            row,
            qty.as_deref(),
            food.as_deref(),
            date,
            json,
        )
        .map(|()| true),
        Commands::Remove { section, row, date } => {
            cmd_remove(&svc, &section, row, date, json).map(|()| true)
        }
        Commands::Notes { text, date } => cmd_notes(&svc, &text, date, json).map(|()| true),
        Commands::Clear { date } => cmd_clear(&svc, date, json).map(|()| true),
        Commands::Food { command } => match command {
            FoodCommands::Add { input } => cmd_food_add(&mut svc, &input, json).map(|()| true),
            FoodCommands::Remove { name } => {
                cmd_food_remove(&mut svc, &name, json).map(|()| true)
            }
            FoodCommands::List { all } => cmd_food_list(&svc, all, json).map(|()| false),
            FoodCommands::Suggest { prefix } => {
                cmd_food_suggest(&svc, &prefix, json).map(|()| false)
            }
            FoodCommands::Carbs { qty, food } => {
                cmd_food_carbs(&svc, &qty, &food, json).map(|()| false)
            }
        },
        Commands::Template { command } => match command {
            TemplateCommands::List { section } => {
                cmd_template_list(&svc, section.as_deref(), json).map(|()| false)
            }
            TemplateCommands::Apply {
                section,
                number,
                date,
            } => cmd_template_apply(&svc, &section, number, date, json).map(|()| true),
            TemplateCommands::Save {
                section,
                name,
                date,
            } => cmd_template_save(&mut svc, &section, &name, date, json).map(|()| true),
            TemplateCommands::Remove { category, number } => {
                cmd_template_remove(&mut svc, &category, number, json).map(|()| true)
            }
        },
        Commands::Import { command } => match command {
            ImportCommands::Report { file } => {
                cmd_import_report(&svc, &file, json).map(|()| true)
            }
            ImportCommands::Backup { file } => {
                cmd_import_backup(&mut svc, &file, json).map(|()| true)
            }
        },
        Commands::Export { out, stdout } => {
            cmd_export(&svc, &config, out.as_deref(), stdout, json).map(|()| false)
        }
        Commands::Status => cmd_status(&svc, &config, json).map(|()| false),
    }?;

    if writes && !json {
        remind_backup(&svc, &config)?;
    }
    Ok(())
}
