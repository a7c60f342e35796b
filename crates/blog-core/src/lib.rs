//! # Blog Core
//!
//! The domain layer of the blog: entities, repository ports, request-scoped
//! view models and the read services that assemble pages from them.
//! Storage lives behind the ports; this crate has no database dependency.

pub mod domain;
pub mod error;
pub mod ports;
pub mod read_model;
pub mod services;

pub use error::{DomainError, RepoError};
pub use services::{AdminService, BlogService, FeedSettings, Repositories};
