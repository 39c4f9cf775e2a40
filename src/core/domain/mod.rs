//! Domain types shared across the core subsystems.

pub mod keyring;
pub mod login;
pub mod member;
pub mod message;
pub mod secret;
pub mod user;

pub use keyring::KeyRing;
pub use login::LoginRequest;
pub use member::ProjectMember;
pub use message::Message;
pub use secret::Secret;
pub use user::{AccountType, User};
