//! Network layer: wire types, error taxonomy, and the REST client.

pub mod api;
pub mod error;
pub mod types;

pub use api::{HttpApi, RemoteApi};
pub use error::ApiError;
