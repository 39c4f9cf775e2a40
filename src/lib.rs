//! Satchel - team secrets, scoped per deployment environment.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Project scaffolding
//! │   ├── login         # Third-party login handshake
//! │   ├── env           # Environment list/new/rm/switch
//! │   ├── secrets       # Secret CRUD
//! │   ├── files         # Tracked file CRUD
//! │   ├── member        # Project member management
//! │   └── run           # Run a command with secrets injected
//! └── core/             # Core library components
//!     ├── crypto/       # Envelope encryption + key resolution
//!     ├── rights        # Role x environment-type permission matrix
//!     ├── store/        # Per-environment secret/file cache
//!     ├── login         # Temporary-code login handshake
//!     ├── sync          # Version-marker reconciliation
//!     ├── api           # HTTP client for the satchel server
//!     ├── manifest      # satchel.toml project manifest
//!     └── config        # Account configuration
//! ```
//!
//! # Features
//!
//! - Envelope encryption addressed to each member's personal key
//!   (age x25519 or SSH keys)
//! - Per-environment secret values and tracked files, switched as an
//!   ordered sequence of store-copy, pointer, and relink, and projected
//!   into the working tree as symlinks
//! - Closed-world role x environment-type permission matrix
//! - Login handshake against a third-party identity provider without a
//!   local redirect listener

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::store::EnvStore;
pub use crate::error::{Error, Result};
