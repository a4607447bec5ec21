//! Middleware for the Web API.

mod auth;
mod cors;

pub use auth::{jwt_auth, AuthUser, OptionalAuthUser};
pub use cors::create_cors_layer;
