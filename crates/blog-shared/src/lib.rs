//! # Blog Shared
//!
//! Plain, template-safe types handed from the read services to the renderer,
//! plus the error body returned by the HTTP layer.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
