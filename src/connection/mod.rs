//! Connection parameters and the active connection session.
//!
//! A session exists only after a successful connectivity probe and gates
//! everything else the assistant can do.

pub mod params;
pub mod session;

pub use params::{ConnectionParams, DatabaseKind};
pub use session::{ConnectionSession, SessionId};
