//! Commerce Server - cart and catalog backend
//!
//! # Overview
//!
//! A small e-commerce backend: a product catalog with category browsing
//! and search, and per-user shopping carts with exact decimal totals.
//! Carts follow a strict lifecycle (pending → paid | cancelled) and the
//! engine guarantees one pending cart per user under concurrency.
//!
//! # Module structure
//!
//! ```text
//! commerce-server/src/
//! ├── core/          # configuration, state, HTTP server
//! ├── auth/          # JWT validation, user context
//! ├── carts/         # cart engine and aggregation
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # SQLite pool, models, repositories
//! └── utils/         # errors, logging, pagination, validation
//! ```

pub mod api;
pub mod auth;
pub mod carts;
pub mod core;
pub mod db;
pub mod routes;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use carts::CartEngine;
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
