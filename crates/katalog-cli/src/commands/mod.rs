pub mod auth_cmd;
pub mod books;
pub mod common;
pub mod completions;
pub mod config;
pub mod lookups;
pub mod status;
