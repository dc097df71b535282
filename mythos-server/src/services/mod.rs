pub mod auth;
pub mod crypto;
pub mod oauth_flow;
pub mod provider;
pub mod qr;
pub mod state_store;

pub use auth::AuthService;
pub use crypto::TokenCipher;
pub use oauth_flow::{BeginAuthorization, LinkedAccountGrant, OAuthFlow};
pub use provider::{DemoProvider, TokenProvider, TwitterProvider};
pub use state_store::{sweep_loop, MemoryStateStore, StateStore};
