//! Cookie parsing and region resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Cookie names carrying this prefix are only issued by the China deployment.
pub const CHINA_COOKIE_PREFIX: &str = "kuaishou";

/// Deployment of the remote service an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// China deployment.
    China,
    /// International deployment.
    International,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::China => write!(f, "china"),
            Self::International => write!(f, "international"),
        }
    }
}

/// Cookies exported from a logged-in browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse a `Cookie` header style string: `name=value` pairs separated by
    /// semicolons. Names are trimmed, values lose one layer of double quotes.
    /// A later pair with the same name replaces the earlier one.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for part in raw.split(';') {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);

            match pairs.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => pairs.push((name.to_string(), value.to_string())),
            }
        }

        if pairs.is_empty() {
            return Err(CoreError::InvalidCookie(
                "no name=value pairs found".to_string(),
            ));
        }

        Ok(Self { pairs })
    }

    /// Region the account belongs to. Depends only on the cookie names.
    pub fn region(&self) -> Region {
        if self
            .pairs
            .iter()
            .any(|(name, _)| name.starts_with(CHINA_COOKIE_PREFIX))
        {
            Region::China
        } else {
            Region::International
        }
    }

    /// Look up a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of cookies in the jar.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always false for a successfully parsed jar.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render back into a single `Cookie` header value.
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
