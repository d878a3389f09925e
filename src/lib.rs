//! # out2nite
//!
//! Client-side session layer for the Out2Nite nightlife API.
//!
//! The crate owns the authentication state machine (login, registration,
//! hydration, logout), the HTTP gateway it talks through, the durable token
//! store, and the route guard that consumes session state. The `activities`
//! module is the first protected consumer built on top of it.

pub mod activities;
pub mod config;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod storage;

pub use config::ClientConfig;
pub use gateway::{Gateway, GatewayError, GatewayResponse, HttpGateway};
pub use guard::{GuardDecision, RouteGuard};
pub use session::{Session, SessionController, SessionPhase, UserProfile};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
