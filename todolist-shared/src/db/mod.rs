/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a connectivity check
/// - `migrations`: Embedded schema migrations
///
/// Queries live on the models; see [`crate::store::postgres`] for the
/// repository built on top of them.

pub mod migrations;
pub mod pool;
