/// Database layer for pmtool
///
/// - `pool`: PostgreSQL connection pool with a health check
/// - `migrations`: embedded schema migrations
///
/// Queries live in [`store::postgres`](crate::store::postgres).

pub mod migrations;
pub mod pool;
