//! Client session: state snapshot plus the controller that drives it.
//!
//! DESIGN
//! ======
//! The controller is an explicit object handed to whoever needs it (views,
//! guards, the CLI), never a module-level singleton, so every test builds
//! its own isolated session.

pub mod controller;
pub mod state;

pub use controller::{LOGIN_FAILED, REGISTRATION_FAILED, SessionController};
pub use state::{Session, SessionPhase, Tag, UserProfile};
