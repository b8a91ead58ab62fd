pub mod entities;
pub mod enums;
pub mod identity_store;

pub use identity_store::{IdentityStore, MemoryIdentityStore, SeaOrmIdentityStore};
