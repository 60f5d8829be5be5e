//! Client account storage backends

mod in_memory;
mod postgres_repository;

pub use in_memory::InMemoryClientAccountRepository;
pub use postgres_repository::PostgresClientAccountRepository;
