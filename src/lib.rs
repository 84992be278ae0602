//! skillsync - scrape, clean and sync skill directory records
//!
//! Pulls plugin records from a public directory, assigns every record a
//! unique URL-safe slug id, and moves records in chunks between JSON
//! files and admin import/export APIs.

pub mod admin;
pub mod cli;
pub mod config;
pub mod directory;
pub mod record;
pub mod slug;
pub mod sqlgen;
pub mod store;
pub mod transfer;
pub mod util;
pub mod verify;
