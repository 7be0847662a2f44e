//! Core circle library (config, API client, session, feed, view state).

pub mod actions;
pub mod api;
pub mod config;
pub mod feed;
pub mod logging;
pub mod page;
pub mod rich_text;
pub mod session;
pub mod token_store;

pub use circle_types as types;
