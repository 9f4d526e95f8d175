use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::SyncError;

type HmacSha256 = Hmac<Sha256>;

/// How long an issued state parameter stays acceptable on callback.
pub const STATE_MAX_AGE_SECS: i64 = 600;

fn new_hmac(key: &[u8]) -> Result<HmacSha256, SyncError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| SyncError::Config(format!("HMAC init failed: {e}")))
}

/// Issues and verifies the CSRF `state` parameter of the authorization flow.
///
/// The payload is `nonce:issued_at`; the wire form is
/// base64url(hmac || payload).
pub struct StateSigner {
    hmac_key: Vec<u8>,
    max_age: Duration,
}

impl StateSigner {
    /// Create a signer from a base64-encoded 32-byte secret.
    pub fn new(secret_b64: &str) -> Result<Self, SyncError> {
        let hmac_key = base64::engine::general_purpose::STANDARD
            .decode(secret_b64)
            .map_err(|e| SyncError::Config(format!("Invalid STATE_SECRET base64: {e}")))?;

        if hmac_key.len() != 32 {
            return Err(SyncError::Config(format!(
                "STATE_SECRET must be 32 bytes, got {}",
                hmac_key.len()
            )));
        }

        Ok(Self {
            hmac_key,
            max_age: Duration::seconds(STATE_MAX_AGE_SECS),
        })
    }

    /// Issue a fresh state parameter stamped with `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, SyncError> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(nonce);

        self.sign(&format!("{nonce}:{}", now.timestamp()))
    }

    /// Check the signature and freshness of a state parameter returned on callback.
    pub fn verify(&self, signed: &str, now: DateTime<Utc>) -> Result<(), SyncError> {
        let payload = self.open(signed)?;

        let issued_at: i64 = payload
            .rsplit_once(':')
            .and_then(|(_, ts)| ts.parse().ok())
            .ok_or(SyncError::InvalidState)?;

        let age = now.timestamp() - issued_at;
        if age < 0 || age > self.max_age.num_seconds() {
            return Err(SyncError::InvalidState);
        }

        Ok(())
    }

    fn sign(&self, payload: &str) -> Result<String, SyncError> {
        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        let mut combined = signature.to_vec();
        combined.extend_from_slice(payload.as_bytes());

        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&combined))
    }

    fn open(&self, signed: &str) -> Result<String, SyncError> {
        let combined = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signed)
            .map_err(|_| SyncError::InvalidState)?;

        if combined.len() < 32 {
            return Err(SyncError::InvalidState);
        }

        let (signature, payload_bytes) = combined.split_at(32);

        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(payload_bytes);
        mac.verify_slice(signature)
            .map_err(|_| SyncError::InvalidState)?;

        String::from_utf8(payload_bytes.to_vec()).map_err(|_| SyncError::InvalidState)
    }
}
