//! Services shared by every client of the core.

mod session;

pub use session::SyncSession;
