pub mod inventory;
pub mod pending_changes;
pub mod reconciliation;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
