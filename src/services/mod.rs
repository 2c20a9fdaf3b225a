pub mod reconciler;
pub mod table_manager;

pub use reconciler::{Reconciler, SaveOutcome};
pub use table_manager::{TableManager, TableStatus};
