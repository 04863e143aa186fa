//! Request authentication.
//!
//! Credentials travel in the `username` / `password` request headers. The check
//! runs once per request, before anything else touches the queue or the store.

use axum::http::HeaderMap;

pub const HEADER_USERNAME: &str = "username";
pub const HEADER_PASSWORD: &str = "password";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            username: read(HEADER_USERNAME),
            password: read(HEADER_PASSWORD),
        }
    }
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> bool;
}

/// Accepts every request. Used when no credentials are configured.
pub struct OpenAuthenticator;

impl Authenticator for OpenAuthenticator {
    fn authenticate(&self, _credentials: &Credentials) -> bool {
        true
    }
}

/// Accepts exactly one configured username/password pair.
pub struct StaticAuthenticator {
    username: String,
    password: String,
}

impl StaticAuthenticator {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> bool {
        credentials.username.as_deref() == Some(self.username.as_str())
            && credentials.password.as_deref() == Some(self.password.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_static_authenticator_requires_both_fields() {
        let auth = StaticAuthenticator::new("alice", "s3cret");

        assert!(auth.authenticate(&Credentials::new("alice", "s3cret")));
        assert!(!auth.authenticate(&Credentials::new("alice", "wrong")));
        assert!(!auth.authenticate(&Credentials::new("bob", "s3cret")));
        assert!(!auth.authenticate(&Credentials::default()));
    }

    #[test]
    fn test_open_authenticator_accepts_anonymous() {
        assert!(OpenAuthenticator.authenticate(&Credentials::default()));
    }

    #[test]
    fn test_credentials_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_USERNAME, HeaderValue::from_static("alice"));
        headers.insert(HEADER_PASSWORD, HeaderValue::from_static("s3cret"));

        let credentials = Credentials::from_headers(&headers);

        assert_eq!(credentials, Credentials::new("alice", "s3cret"));
        assert_eq!(Credentials::from_headers(&HeaderMap::new()), Credentials::default());
    }
}
