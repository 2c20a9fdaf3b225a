pub mod draft;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod store;
pub mod table_api;

pub use draft::{DraftBuffer, DraftState};
pub use error::AppError;
pub use models::CourseTable;
pub use services::{Reconciler, SaveOutcome, TableManager, TableStatus};
