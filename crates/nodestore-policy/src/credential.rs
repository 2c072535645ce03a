//! Static username/password credentials.

use std::fmt;
use std::str::FromStr;

use subtle::{Choice, ConstantTimeEq};

use crate::error::PolicyError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Compare against `other` without branching on which field differs.
    ///
    /// Both fields always go through `ct_eq`; the results are combined with a
    /// bitwise AND.
    pub fn ct_matches(&self, other: &Credential) -> Choice {
        let user = self.username.as_bytes().ct_eq(other.username.as_bytes());
        let pass = self.password.as_bytes().ct_eq(other.password.as_bytes());
        user & pass
    }

    /// Parse a comma separated `user:pass[,user:pass...]` list.
    ///
    /// An empty string yields no credentials. Passwords may contain `:`.
    pub fn parse_list(s: &str) -> Result<Vec<Credential>, PolicyError> {
        if s.is_empty() {
            return Ok(Vec::new());
        }
        s.split(',')
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .parse::<Credential>()
                    .map_err(|_| PolicyError::InvalidCredentials(i))
            })
            .collect()
    }
}

impl FromStr for Credential {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, password) = s
            .split_once(':')
            .ok_or(PolicyError::InvalidCredentials(0))?;
        Ok(Credential::new(username, password))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
