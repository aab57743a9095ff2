//! Posting engine.
//!
//! Turns business events (an invoice issued, a bill paid, a bank line
//! categorized, ...) into balanced journal entry plans. Plans name system
//! accounts symbolically; the persistence layer resolves them to rows inside
//! the posting transaction.

pub mod event;
pub mod service;
pub mod types;

pub use event::PostingEvent;
pub use service::PostingService;
pub use types::{AccountRef, PlannedLine, PostingPlan, SystemAccount};
