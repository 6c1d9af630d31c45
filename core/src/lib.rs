pub mod backup;
pub mod calc;
pub mod db;
pub mod error;
pub mod foods;
pub mod models;
pub mod report;
pub mod service;
pub mod templates;

pub use error::{JournalError, Result};
pub use service::JournalService;
