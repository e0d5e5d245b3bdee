pub mod revmap_repo;
pub mod schema;
pub mod store;
pub mod ticket_repo;
pub mod util;

#[cfg(test)]
mod bridge_tests;

pub use crate::store::DbStore;
