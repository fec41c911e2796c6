//! Authentication service for the admin API token.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Service for authenticating admin requests via Bearer tokens.
///
/// The configured token is kept only as an HMAC-SHA256 digest keyed by
/// `signing_secret`; presented tokens are digested the same way and compared
/// in constant time.
pub struct AuthService {
    signing_secret: String,
    admin_token_digest: Option<Vec<u8>>,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `admin_token` - accepted bearer token; `None` disables the admin API
    /// - `signing_secret` - HMAC key
    pub fn new(admin_token: Option<&str>, signing_secret: String) -> Self {
        let admin_token_digest = admin_token.map(|token| digest(&signing_secret, token));
        Self {
            signing_secret,
            admin_token_digest,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.admin_token_digest.is_some()
    }

    /// First 8 hex digits of the token digest, safe to log.
    pub fn token_fingerprint(&self) -> Option<String> {
        self.admin_token_digest
            .as_ref()
            .map(|d| hex::encode(&d[..4]))
    }

    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the admin API is disabled or the
    /// token does not match.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        let Some(expected) = &self.admin_token_digest else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Admin API is disabled"}),
            ));
        };

        let mut mac = mac_for(&self.signing_secret);
        mac.update(token.as_bytes());

        mac.verify_slice(expected).map_err(|_| {
            AppError::unauthorized("Unauthorized", json!({"reason": "Invalid token"}))
        })
    }
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

fn digest(secret: &str, token: &str) -> Vec<u8> {
    let mut mac = mac_for(secret);
    mac.update(token.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
