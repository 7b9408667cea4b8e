//! # storage
//!
//! Per-chat user records: the [`UserStore`] interface consumed by the authorization gate and the
//! bot controller, [`StorageError`], and [`InMemoryUserStore`].

mod error;
mod memory;
mod repository;

pub use error::StorageError;
pub use memory::InMemoryUserStore;
pub use repository::UserStore;
