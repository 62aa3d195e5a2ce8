//! Observability module - request IDs and their propagation into error bodies.

mod request_id;

pub use request_id::{RequestIdMiddleware, current_request_id};
