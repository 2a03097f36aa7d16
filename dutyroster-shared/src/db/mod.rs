/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Table-level queries live with the records in [`crate::models`]; the
/// [`crate::store::postgres::PgStore`] adapter ties them to the storage ports.

pub mod migrations;
pub mod pool;
