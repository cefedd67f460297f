use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::types::User;

type HmacSha256 = Hmac<Sha256>;

/// Sessions expire a fixed 24 hours after issue; there is no refresh.
pub const SESSION_TTL_HOURS: i64 = 24;

const SECRET_BYTES: usize = 32;

/// The signed payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub username: String,
    pub role: String,
    pub exp: i64,
}

/// Signs and verifies session tokens.
///
/// Token format: `base64url(claims_json).base64url(hmac_sha256(claims_json))`.
/// Verification is stateless; nothing is stored per session.
#[derive(Clone)]
pub struct SessionKey {
    secret: Vec<u8>,
}

impl SessionKey {
    #[must_use]
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Generates a fresh random signing secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill(&mut bytes);
        Self {
            secret: bytes.to_vec(),
        }
    }

    /// Loads a secret from its hex form (the on-disk representation).
    pub fn from_hex(s: &str) -> Result<Self> {
        let secret =
            hex::decode(s.trim()).map_err(|e| Error::Config(format!("invalid secret: {e}")))?;
        if secret.len() < SECRET_BYTES {
            return Err(Error::Config("session secret too short".to_string()));
        }
        Ok(Self { secret })
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.secret)
    }

    /// Issues a signed token for the user, expiring in 24 hours.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            exp: (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| Error::Config(format!("failed to encode claims: {e}")))?;
        let tag = self.mac(&payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// Verifies signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(Error::InvalidTokenFormat)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| Error::InvalidTokenFormat)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| Error::InvalidTokenFormat)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key size");
        mac.update(&payload);
        mac.verify_slice(&tag).map_err(|_| Error::Unauthorized)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| Error::InvalidTokenFormat)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(Error::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
