//! Reconciliation engine for a school's tuition workbook.
//!
//! The library loads the roster and monthly cash ledgers from an `.xlsx`
//! workbook, decides which students paid each month, supports recording and
//! undoing payments and expenses, and exports everything back to the same
//! layout. IO adapters live under [`io`], record types in [`model`], the
//! student/entry matching rules in [`matcher`], the mutable state and its
//! operations in [`store`], and the load-once session wrapper in
//! [`session`].

pub mod config;
pub mod error;
pub mod io;
pub mod matcher;
pub mod model;
pub mod session;
pub mod store;

pub use config::Settings;
pub use error::{Result, TuitionError};
pub use matcher::MatchMode;
pub use session::Session;
pub use store::ReconciliationStore;
