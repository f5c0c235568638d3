//! Database repositories for the data access layer
//!
//! One repository per aggregate (users, recordings, transcripts, debriefs,
//! jobs, chat). Each is a thin wrapper over a shared `PgPool` using dynamic
//! sqlx queries, so no live database is required at compile time. Schema
//! migrations are embedded from `migrations/` and applied at startup and in
//! test setup through [`MIGRATOR`].

pub mod db;

pub use db::{
    ChatRepository, DebriefRepository, JobRepository, RecordingRepository, TranscriptRepository,
    UserRepository,
};

/// Embedded schema migrations, applied with `MIGRATOR.run(&pool)`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
