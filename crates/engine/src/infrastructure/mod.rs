//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod broadcast;
pub mod cache;
pub mod canvas;
pub mod clock;
pub mod messaging;
pub mod ports;
pub mod presentation;
pub mod settings;
