/// Database layer
///
/// - `pool`: connection pool construction, health checks and stats
/// - `migrations`: embedded schema migrations
///
/// Models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
