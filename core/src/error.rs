use thiserror::Error;

/// Errors surfaced by the journal core.
///
/// Every variant is recoverable: callers report it and carry on with the
/// state they had before the failing call.
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid carb value {0}: must be a non-negative number")]
    InvalidFoodValue(f64),

    #[error("Invalid food entry '{0}'. Use 'food name carbs' (e.g. 'raccoon soup 20')")]
    InvalidFoodInput(String),

    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    #[error("No data to import")]
    NoDataToImport,

    #[error("No items to save: add some food items before saving a template")]
    NoItemsToSave,

    #[error("No custom template #{index} in category '{category}'")]
    TemplateNotFound { category: String, index: usize },

    #[error("Invalid template category '{0}'. Must be one of: breakfast, lunch, dinner, snacks")]
    InvalidCategory(String),

    #[error("Invalid meal section '{0}'. Must be one of: Brunch, Snack, Dinner, Evening Snack")]
    InvalidSection(String),

    #[error("No row {row} in section '{section}'")]
    InvalidRow { section: String, row: usize },

    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JournalError>;
