pub mod db_pool;
pub mod engine;
pub mod introspect;
pub mod schema;
