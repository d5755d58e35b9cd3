//! Ludus server - sessions, coordination and HTTP API for ludus latrunculorum.
//!
//! The rules live in [`ludus_rules`]; this crate stores games as compressed
//! config and move text, arbitrates seats between racing players, and tells
//! a waiting player when it is their turn.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] contract with [`MemoryStore`] and [`SqliteStore`] backends
//! - **Coordination**: [`Coordinator`] join arbitration and turn waits
//! - **Service**: [`GameService`] request-level operations returning [`StateView`]
//! - **API**: axum [`router`] with the documented error shape
//! - **Config**: [`ServerConfig`] loaded from TOML
//!
//! # Example
//!
//! ```no_run
//! use ludus_server::{ApiState, GameService, ServerConfig, open_store, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let store = open_store(config.storage())?;
//! let service = GameService::from_config(store, &config)?;
//! let app = router(ApiState::new(service, config.wait_timeout()));
//! let listener = tokio::net::TcpListener::bind(("127.0.0.1", 3000)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod config;
mod coordination;
mod error;
mod service;
mod store;

pub use api::{ApiState, router};
pub use config::{ConfigError, ServerConfig, StorageConfig};
pub use coordination::{Coordinator, JoinedSeat};
pub use error::{ErrorKind, LudusError};
pub use service::{GameService, StateView};
pub use store::{
    ClaimOutcome, MemoryStore, SessionEntry, SessionStore, SqliteStore, StoreError,
    StoreErrorKind, open_store,
};
