//! # Kindred Shared
//!
//! Wire types between the API server and its clients.
//! Everything here is plain serde data so it also compiles for WASM clients.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
