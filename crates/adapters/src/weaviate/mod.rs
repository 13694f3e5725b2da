//! Adapter for the vector database's REST schema endpoints.

pub mod auth;
pub mod base_url;
pub mod error;
pub mod rest;

pub use rest::{WeaviateRestConfig, WeaviateRestSchema};
