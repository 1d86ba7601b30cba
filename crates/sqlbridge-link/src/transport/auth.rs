//! Authentication for the HTTP transports.
//!
//! Attaches HTTP Basic or bearer-token credentials to outgoing requests.

use base64::{engine::general_purpose, Engine as _};
use sqlbridge_commons::Result;

/// Credentials for an HTTP engine endpoint.
///
/// # Examples
///
/// ```rust
/// use sqlbridge_link::AuthProvider;
///
/// // HTTP Basic Auth
/// let auth = AuthProvider::basic_auth("analyst".to_string(), "secret".to_string());
///
/// // OAuth / personal access token
/// let auth = AuthProvider::bearer_token("eyJhbGc...".to_string());
///
/// // Engines behind a trusted proxy
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password)
    BasicAuth(String, String),

    /// Bearer token; may expire and need a refresh
    BearerToken(String),

    /// No authentication
    None,
}

impl AuthProvider {
    pub fn basic_auth(username: String, password: String) -> Self {
        Self::BasicAuth(username, password)
    }

    pub fn bearer_token(token: String) -> Self {
        Self::BearerToken(token)
    }

    pub fn none() -> Self {
        Self::None
    }

    /// Value of the `Authorization` header, if any.
    ///
    /// - BasicAuth: `Basic <base64(username:password)>` (RFC 7617)
    /// - BearerToken: `Bearer <token>`
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            Self::BasicAuth(username, password) => {
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {}", encoded))
            },
            Self::BearerToken(token) => Some(format!("Bearer {}", token)),
            Self::None => None,
        }
    }

    /// Attach authentication headers to a request builder.
    pub fn apply_to_request(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::RequestBuilder> {
        Ok(match self.authorization_header() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        })
    }

    /// Replace an expired bearer token.
    pub fn refresh_token(&mut self, token: String) {
        *self = Self::BearerToken(token);
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
