//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod query;
mod repository;

pub use query::{CommentFilter, Page, PageRequest, PostFilter, PublishedRange};
pub use repository::{
    BaseRepository, CommentRepository, PostRepository, TagRepository, UserRepository,
};
