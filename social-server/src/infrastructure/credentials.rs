use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_TTL_HOURS: i64 = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid credential")]
    Invalid,
    #[error("credential expired")]
    Expired,
    #[error("credential subject is missing or not a user id")]
    MalformedClaim,
    #[error("failed to issue credential: {0}")]
    Issue(String),
}

/// Claims written by [`CredentialCodec::issue`].
#[derive(Debug, Serialize)]
struct IssuedClaims {
    user_id: u64,
    authorized: bool,
    iat: i64,
    exp: i64,
}

/// Claims as read back. The subject is kept loose because other encoders
/// emit it as a float or a signed integer.
#[derive(Debug, Deserialize)]
struct ReceivedClaims {
    #[serde(default)]
    user_id: Option<Value>,
}

/// Signs and verifies HMAC bearer credentials with the process secret.
#[derive(Clone)]
pub struct CredentialCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl CredentialCodec {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: u64) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = IssuedClaims {
            user_id,
            authorized: true,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| CredentialError::Issue(err.to_string()))
    }

    pub fn verify(&self, credential: &str) -> Result<u64, CredentialError> {
        let data = decode::<ReceivedClaims>(credential, &self.decoding, &validation())
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Invalid,
            })?;

        data.claims
            .user_id
            .as_ref()
            .ok_or(CredentialError::MalformedClaim)
            .and_then(normalize_subject)
    }
}

// Anything outside the HMAC family is refused, including `none`.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation
}

fn normalize_subject(value: &Value) -> Result<u64, CredentialError> {
    let Value::Number(number) = value else {
        return Err(CredentialError::MalformedClaim);
    };

    let id = if let Some(id) = number.as_u64() {
        id
    } else if number.as_i64().is_some() {
        // only negatives reach this branch
        return Err(CredentialError::MalformedClaim);
    } else {
        match number.as_f64() {
            Some(f) if f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                f as u64
            }
            _ => return Err(CredentialError::MalformedClaim),
        }
    };

    if id == 0 {
        return Err(CredentialError::MalformedClaim);
    }
    Ok(id)
}
