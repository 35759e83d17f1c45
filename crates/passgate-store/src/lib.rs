//! passgate-store - durable credential storage.
//!
//! [`CredentialStore`] persists a session's token and user profile under an
//! application namespace on top of any [`KeyValueStorage`]. Two storage
//! substrates are provided: [`FileStorage`] for credentials that survive a
//! restart and [`MemoryStorage`] for tests and throwaway sessions.
//!
//! [`KeyValueStorage`]: passgate_core::KeyValueStorage

mod credential_store;
mod file;
mod memory;

pub use credential_store::CredentialStore;
pub use file::FileStorage;
pub use memory::MemoryStorage;
