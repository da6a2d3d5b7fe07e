//! Client for the FlowForge backend.
//!
//! - [`ApiClient`]: one typed method per REST operation, with bearer
//!   authentication and the 401 redirect
//! - [`Session`]: the persisted token and user record
//! - [`Navigator`]: where the 401 handler sends the user
//! - [`RealtimeClient`]: the WebSocket event channel (native targets)

pub mod api;
pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod navigation;
#[cfg(not(target_arch = "wasm32"))]
pub mod realtime;
pub mod scheduler;
pub mod session;
pub mod timestamp;

pub use api::{ApiClient, BulkDelete};
pub use auth::{Credentials, LoginResponse, User};
pub use config::ClientConfig;
pub use envelope::{ApiResponse, Page, Pagination};
pub use error::ClientError;
pub use navigation::{MemoryNavigator, Navigator};
#[cfg(not(target_arch = "wasm32"))]
pub use realtime::{RealtimeClient, RealtimeMessage, ReconnectPolicy, Subscription};
pub use scheduler::{OutcomeStatus, SchedulerConfig, SchedulerKind, SchedulerResponse, TaskOutcome};
#[cfg(not(target_arch = "wasm32"))]
pub use session::FileStorage;
pub use session::{MemoryStorage, Session, SessionStorage};
