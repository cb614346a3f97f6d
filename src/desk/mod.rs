//! Front desk of the salon: registration, prepaid minutes and broadcasts.
//!
//! Transport-free: callers feed messages in as [`Input`] and render the
//! returned [`Reply`] however their messenger needs.

/// Conversation state machine
pub mod session;
/// Customer records and balances
pub mod store;

pub use session::{Cmd, Desk, Input, Op, Reply, Session, State};
pub use store::{Balance, MemoryStore, SalonStore, StoreError, UserId, UserRecord};
