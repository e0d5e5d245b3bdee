pub mod bridge;
pub mod commands;
pub mod config;
pub mod error;
pub mod hook;
pub mod links;
pub mod mutate;
pub mod notify;
pub mod redirect;
pub mod revmap;
pub mod revmap_import;
pub mod store;
pub mod tickets;

pub mod types;

pub use crate::bridge::Bridge;
pub use crate::error::BridgeError;
pub use crate::notify::Notifier;
pub use crate::store::Store;
