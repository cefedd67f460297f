//! # Apotek
//!
//! A point-of-sale and inventory server for a small pharmacy chain, usable
//! both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! apotek = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use apotek::auth::SessionKey;
//! use apotek::server::{AppState, create_router};
//! use apotek::store::SqliteStore;
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/apotek.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), SessionKey::generate()));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI entry point. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
