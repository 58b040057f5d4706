/// Store trait and in-memory implementation.
pub mod game_store;
/// Persisted entity definitions.
pub mod models;
/// Storage error taxonomy and uniqueness constraints.
pub mod storage;
