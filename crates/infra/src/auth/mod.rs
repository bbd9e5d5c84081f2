//! Credential handling: key sources, minters and the token cache

pub mod credential_cache;
pub mod key_provider;
pub mod minter;

pub use credential_cache::CredentialCache;
pub use key_provider::{key_provider_for, EnvKeyProvider, FileKeyProvider, InlineKeyProvider};
pub use minter::StaticTokenMinter;
