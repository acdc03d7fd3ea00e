//! Session cookies issued at login.

use std::fmt;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Extract the value of cookie `name` from a `Set-Cookie` (or `Cookie`) header.
///
/// Attributes after the first `;` of the matching pair are ignored. Returns
/// `None` when the cookie is absent or empty.
pub fn extract_cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key.trim() == name && !value.is_empty()).then_some(value.trim())
    })
}

/// Access and refresh tokens returned by a successful login.
///
/// They are sent back verbatim as cookies on every authenticated call and are
/// never refreshed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerTokens {
    pub access: String,
    pub refresh: String,
}

impl BearerTokens {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!(
            "{ACCESS_TOKEN_COOKIE}={}; {REFRESH_TOKEN_COOKIE}={}",
            self.access, self.refresh
        )
    }
}

impl fmt::Debug for BearerTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokens").finish_non_exhaustive()
    }
}
