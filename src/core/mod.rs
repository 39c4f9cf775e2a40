//! Core subsystems, independent of the CLI surface.

pub mod api;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod envfile;
pub mod gitignore;
pub mod login;
pub mod manifest;
pub mod pipeline;
pub mod rights;
pub mod store;
pub mod sync;
