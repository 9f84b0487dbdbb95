//! Identities handed out by the authorization endpoint.
//!
//! The provider has no login step. Each authorization either invents a fresh
//! user or, when a fixture user is configured, always returns that one so the
//! claims seen by a client are predictable.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Chiara", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas",
];
const LAST_NAMES: &[&str] = &[
    "Andersen", "Baptiste", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Haddad", "Ito",
    "Kowalski",
];

/// The user a credential speaks for. Never mutated once bound to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl UserIdentity {
    /// Generates a random, plausible-looking user.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith");
        let sub = uuid::Uuid::new_v4().to_string();
        let handle = format!("{}.{}", first.to_lowercase(), last.to_lowercase());

        UserIdentity {
            name: format!("{first} {last}"),
            email: format!("{handle}@example.com"),
            picture: format!("https://picsum.photos/seed/{}/200/200", &sub[..8]),
            sub,
        }
    }
}

/// Where the authorization endpoint gets its users from.
#[derive(Debug, Clone)]
pub enum IdentitySource {
    Random,
    Fixed(UserIdentity),
}

impl IdentitySource {
    pub fn from_fixture(fixture: Option<UserIdentity>) -> Self {
        match fixture {
            Some(user) => IdentitySource::Fixed(user),
            None => IdentitySource::Random,
        }
    }

    pub fn next_identity(&self) -> UserIdentity {
        match self {
            IdentitySource::Random => UserIdentity::generate(),
            IdentitySource::Fixed(user) => user.clone(),
        }
    }
}
