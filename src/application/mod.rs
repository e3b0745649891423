//! Application services: feed paging, posting, editing and access control.

pub mod composer;
pub mod editor;
pub mod error;
pub mod feed;
pub mod guard;
pub mod images;
pub mod pagination;
pub mod repos;
pub mod stream;
