//! # Kindred Core
//!
//! The domain layer of the Kindred backend.
//! This crate contains entities, ports and the services that orchestrate them,
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
