use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};

use crate::domain::error::DomainError;
use crate::domain::user::UserId;
use crate::infrastructure::credentials::{CredentialCodec, CredentialError};
use crate::presentation::middleware::RequestId;

pub const NO_CREDENTIAL: &str = "no credential found";

/// Identity placed into request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(*user)),
            None => ready(Err(DomainError::Unauthenticated(NO_CREDENTIAL.into()))),
        }
    }
}

/// Pulls the credential out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

pub fn resolve_subject(codec: &CredentialCodec, token: &str) -> Result<AuthenticatedUser, DomainError> {
    let subject = codec.verify(token)?;
    let id = UserId::try_from(subject).map_err(|_| CredentialError::MalformedClaim)?;
    Ok(AuthenticatedUser { id })
}

pub fn ensure_owner(owner_id: UserId, user_id: UserId, message: &str) -> Result<(), DomainError> {
    if owner_id != user_id {
        Err(DomainError::forbidden(message))
    } else {
        Ok(())
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(Some("bearer   abc")), Some("abc"));
        assert_eq!(extract_bearer(Some("BEARER abc")), Some("abc"));
    }

    #[test]
    fn malformed_headers_yield_nothing() {
        assert_eq!(extract_bearer(None), None);
        assert_eq!(extract_bearer(Some("")), None);
        assert_eq!(extract_bearer(Some("abc")), None);
        assert_eq!(extract_bearer(Some("Basic abc")), None);
        assert_eq!(extract_bearer(Some("Bearer abc def")), None);
    }

    #[test]
    fn resolve_subject_maps_codec_failures() {
        let codec = CredentialCodec::new("secret");
        let token = codec.issue(42).unwrap();
        assert_eq!(resolve_subject(&codec, &token).unwrap(), AuthenticatedUser { id: 42 });

        assert_matches!(
            resolve_subject(&codec, "garbage"),
            Err(DomainError::Unauthenticated(_))
        );

        let too_big = codec.issue(u64::MAX).unwrap();
        assert_matches!(
            resolve_subject(&codec, &too_big),
            Err(DomainError::Unauthenticated(_))
        );
    }

    #[test]
    fn ensure_owner_forbids_strangers() {
        assert!(ensure_owner(5, 5, "nope").is_ok());
        assert_matches!(ensure_owner(5, 7, "nope"), Err(DomainError::Forbidden(m)) if m == "nope");
    }
}
