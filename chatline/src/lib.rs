pub mod backend;
pub mod chat;
pub mod contact;
pub mod keys;
pub mod models;
pub mod profile;
pub mod storage;

// Configuration (JSON file settings plus session/secret backed by storage)
pub mod config;

mod error;

pub use error::{Error, Result};
