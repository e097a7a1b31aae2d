//! Order data structures: the persisted record and its identifier.

pub mod order;

pub use order::*;
