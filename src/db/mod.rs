//! Postgres-backed job queue
//!
//! Jobs live in a `jobs` table:
//!
//! ```sql
//! CREATE TABLE jobs (
//!     id            SERIAL PRIMARY KEY,
//!     name          TEXT,
//!     command       TEXT NOT NULL,
//!     priority      INTEGER NOT NULL DEFAULT 0,
//!     state         TEXT NOT NULL DEFAULT 'waiting',
//!     runner        TEXT,
//!     planified_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     started_at    TIMESTAMPTZ,
//!     ended_at      TIMESTAMPTZ,
//!     result_code   INTEGER,
//!     result_output TEXT,
//!     result_error  TEXT,
//!     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

pub mod connection;
pub mod jobs;
pub mod manager;
pub mod models;

pub use connection::{create_pool, create_pool_from_env, DbPool};
pub use manager::{PgJobManager, ShellJob};
pub use models::*;
