pub mod cid;
pub mod config;
pub mod db;
pub mod error;
pub mod server;

pub use cid::Cid;
pub use db::{SqliteStore, Store};
pub use error::{StoreError, StoreResult};
