//! Scopes understood by the provider.

use crate::error::OAuth2Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A permission unit controlling which identity claims are disclosed.
///
/// Declaration order is the canonical order used when a set is joined back
/// into a space-separated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Openid,
    Profile,
    Email,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Openid, Scope::Profile, Scope::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Openid => "openid",
            Scope::Profile => "profile",
            Scope::Email => "email",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openid" => Ok(Scope::Openid),
            "profile" => Ok(Scope::Profile),
            "email" => Ok(Scope::Email),
            other => Err(other.to_string()),
        }
    }
}

/// A deduplicated set of granted scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    /// Parses a space-separated scope parameter.
    ///
    /// Every unknown token is reported, in the order first seen, so the
    /// error names all of them at once.
    pub fn parse(raw: &str) -> Result<Self, OAuth2Error> {
        let mut scopes = BTreeSet::new();
        let mut unknown: Vec<String> = Vec::new();

        for token in raw.split_whitespace() {
            match token.parse::<Scope>() {
                Ok(scope) => {
                    scopes.insert(scope);
                }
                Err(bad) => {
                    if !unknown.contains(&bad) {
                        unknown.push(bad);
                    }
                }
            }
        }

        if unknown.is_empty() {
            Ok(ScopeSet(scopes))
        } else {
            Err(OAuth2Error::InvalidScope(unknown))
        }
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        ScopeSet(iter.into_iter().collect())
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(scope.as_str())?;
            first = false;
        }
        Ok(())
    }
}
