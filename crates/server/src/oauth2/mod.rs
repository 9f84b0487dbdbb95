//! OAuth2 Authorization Server module.
//!
//! An in-memory authorization server that hands out credentials to OAuth2
//! clients under test. There is no login or consent step.
//!
//! ## Supported Flows
//!
//! - Authorization Code
//! - Refresh Token (rotating)
//!
//! ## Endpoints
//!
//! - `GET /authorize` - Authorization endpoint
//! - `POST /token` - Token endpoint
//! - `POST /revoke` - Token revocation
//! - `GET /userinfo` - Scope-filtered identity
//! - `GET /.well-known/openid-configuration` - Discovery

pub mod authorize;
pub mod credentials;
pub mod endpoints;
pub mod guard;
pub mod identity;
pub mod scope;
pub mod state;
pub mod store;
pub mod token;

pub use endpoints::router;
pub use identity::{IdentitySource, UserIdentity};
pub use scope::{Scope, ScopeSet};
pub use state::{OAuth2State, ProviderSettings};
pub use store::CredentialStore;

/// OpenAPI tag for OAuth2 endpoints
pub const OAUTH2_TAG: &str = "OAuth2";
