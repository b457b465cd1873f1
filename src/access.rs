use crate::error::RelayError;
use axum::http::HeaderValue;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const SESSION_COOKIE_NAME: &str = "auth-token";
pub const SESSION_COOKIE_PATH: &str = "/stream";
pub const SESSION_MAX_AGE_SECS: u64 = 86400;

/// Whether `value` can travel unchanged as a cookie value, a header and a
/// URL query token (RFC 6265 cookie-octets).
pub fn is_token_safe(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
        })
}

/// A shared secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive, constant-time comparison.
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Validates presented credentials against the user and admin secrets.
#[derive(Clone, Debug)]
pub struct AccessController {
    inner: Arc<Secrets>,
}

#[derive(Debug)]
struct Secrets {
    user: Secret,
    admin: Secret,
}

impl AccessController {
    pub fn new(user: Secret, admin: Secret) -> Self {
        Self {
            inner: Arc::new(Secrets { user, admin }),
        }
    }

    pub fn user_secret(&self) -> &Secret {
        &self.inner.user
    }

    /// One-time token check used by `/play` and `/generate`.
    pub fn check_token(&self, presented: Option<&str>) -> Result<(), RelayError> {
        let Some(token) = presented else {
            return Err(RelayError::MissingCredential);
        };
        if self.inner.user.matches(token) {
            Ok(())
        } else {
            warn!("Invalid one-time token");
            Err(RelayError::InvalidCredential)
        }
    }

    /// Session cookie check used by `/stream`.
    pub fn check_session(&self, cookie: Option<&str>) -> Result<(), RelayError> {
        let Some(value) = cookie else {
            return Err(RelayError::MissingCredential);
        };
        if self.inner.user.matches(value) {
            Ok(())
        } else {
            warn!("Invalid session cookie");
            Err(RelayError::Forbidden)
        }
    }

    /// Admin token check. The panel view answers 403 for any failure, the
    /// delete action answers 401; callers map accordingly.
    pub fn check_admin(&self, presented: Option<&str>) -> Result<(), RelayError> {
        let Some(token) = presented else {
            return Err(RelayError::MissingCredential);
        };
        if self.inner.admin.matches(token) {
            Ok(())
        } else {
            warn!("Invalid admin token");
            Err(RelayError::InvalidCredential)
        }
    }

    /// `Set-Cookie` value for the streaming session. Same value and window on
    /// every call, so re-issuing is harmless.
    pub fn session_cookie(&self) -> Result<HeaderValue, RelayError> {
        let cookie = format!(
            "{SESSION_COOKIE_NAME}={}; HttpOnly; Secure; Path={SESSION_COOKIE_PATH}; SameSite=Strict; Max-Age={SESSION_MAX_AGE_SECS}",
            self.inner.user.expose()
        );
        HeaderValue::from_str(&cookie)
            .map_err(|_| RelayError::Internal("Secret is not a valid cookie value".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AccessController {
        AccessController::new(Secret::new("user-secret"), Secret::new("admin-secret"))
    }

    #[test]
    fn test_secret_matches_exactly() {
        let secret = Secret::new("Abc123");
        assert!(secret.matches("Abc123"));
        assert!(!secret.matches("abc123"));
        assert!(!secret.matches(" Abc123"));
        assert!(!secret.matches("Abc1234"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", Secret::new("hunter2")), "Secret(***)");
    }

    #[test]
    fn test_check_token() {
        let access = controller();
        assert_eq!(access.check_token(Some("user-secret")), Ok(()));
        assert_eq!(
            access.check_token(Some("admin-secret")),
            Err(RelayError::InvalidCredential)
        );
        assert_eq!(access.check_token(None), Err(RelayError::MissingCredential));
    }

    #[test]
    fn test_check_session() {
        let access = controller();
        assert_eq!(access.check_session(Some("user-secret")), Ok(()));
        assert_eq!(
            access.check_session(Some("USER-SECRET")),
            Err(RelayError::Forbidden)
        );
        assert_eq!(
            access.check_session(Some("user-secret ")),
            Err(RelayError::Forbidden)
        );
        assert_eq!(
            access.check_session(None),
            Err(RelayError::MissingCredential)
        );
    }

    #[test]
    fn test_check_admin() {
        let access = controller();
        assert_eq!(access.check_admin(Some("admin-secret")), Ok(()));
        assert_eq!(
            access.check_admin(Some("user-secret")),
            Err(RelayError::InvalidCredential)
        );
        assert_eq!(access.check_admin(None), Err(RelayError::MissingCredential));
    }

    #[test]
    fn test_token_safe_values() {
        assert!(is_token_safe("user-secret"));
        assert!(is_token_safe("A1_b2.c3~d4!"));
        assert!(!is_token_safe(""));
        assert!(!is_token_safe("two words"));
        assert!(!is_token_safe("a;b"));
        assert!(!is_token_safe("a,b"));
        assert!(!is_token_safe("a\"b"));
        assert!(!is_token_safe("a\\b"));
        assert!(!is_token_safe("caf\u{e9}"));
    }

    #[test]
    fn test_unusable_secret_is_a_server_error() {
        let access = AccessController::new(Secret::new("bad\nsecret"), Secret::new("admin"));
        assert!(matches!(
            access.session_cookie(),
            Err(RelayError::Internal(_))
        ));
    }

    #[test]
    fn test_session_cookie_format() {
        let access = controller();
        let cookie = access.session_cookie().unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "auth-token=user-secret; HttpOnly; Secure; Path=/stream; SameSite=Strict; Max-Age=86400"
        );
        assert_eq!(access.session_cookie().unwrap(), cookie);
    }
}
