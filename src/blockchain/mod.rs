pub mod client;
pub mod models;
pub mod participants;
pub mod polling;
pub mod processor;

// Re-exports for convenience
pub use client::{ChainError, ChainSource, SteemClient};
pub use polling::{EngineSettings, SyncEngine, SyncError, TickOutcome};
pub use processor::BlockProcessor;
