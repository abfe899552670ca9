//! Database layer for the Murmur backend.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode
//! initialization, embedded SQL migrations, and the community-gallery
//! queries. Every table is created through versioned migrations managed
//! by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: no external database process required;
//!   WAL allows concurrent readers with a single writer, which matches
//!   the gallery's read-heavy access pattern.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management. The pool is created once at startup and lives
//!   for the whole process, so handlers never race to initialize a
//!   connection handle.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, ensuring migrations ship with the server and cannot
//!   drift from the code that depends on them.

pub mod gallery;
mod migrations;
mod pool;

pub use gallery::{insert_model, list_models, ModelRecord, NewModel, RECENT_MODELS_LIMIT};
pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool, DbRuntimeSettings};
