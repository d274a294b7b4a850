//! Concurrent session storage.

mod store;

pub use store::SessionStore;
