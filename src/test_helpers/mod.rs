// Test Helpers Module - In-Memory Collaborators
//
// Thread-safe in-memory implementations of the store, gateway, log store and
// location resolver seams. They follow the PostgreSQL and Telegram semantics
// closely enough to run the full worker protocols without external services.

pub mod gateway;
pub mod location_resolver;
pub mod log_store;
pub mod order_store;
pub mod test_utils;

pub use gateway::RecordingGateway;
pub use location_resolver::StaticLocationResolver;
pub use log_store::InMemoryLogStore;
pub use order_store::InMemoryOrderStore;
pub use test_utils::{auto_forward_payload, get_test_database_url, test_config};
