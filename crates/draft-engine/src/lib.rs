//! Draft persistence and versioning session layer
//!
//! Owns the live document session: debounced autosave, the save state
//! machine, bounded version history, restore/rollback, and the store
//! abstraction the session persists through.

pub mod error;
pub mod http;
pub mod scheduler;
pub mod session;
pub mod store;

pub use error::DraftError;
pub use http::HttpDraftStore;
pub use scheduler::{AutoValidationTimer, DebounceScheduler, AUTOSAVE_QUIET_PERIOD};
pub use session::{DocumentSession, SaveState};
pub use store::{DraftStore, MemoryDraftStore, SaveReceipt, SaveRequest, VERSION_HISTORY_LIMIT};
