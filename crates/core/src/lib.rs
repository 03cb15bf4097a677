//! Core business logic for the polling service.

pub mod services;

pub use services::*;
