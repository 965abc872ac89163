// src/utils/token.rs
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::{User, UserRole, UserStatus};

/// Claims embedded in every issued credential. Role and status ride along so
/// the client can react to live role changes without a round trip; the
/// server still re-reads the user row on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    user: &User,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user.id.to_string(),
        role: user.role,
        status: user.status,
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(expires_in_seconds)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &[u8],
) -> Result<Uuid, crate::error::HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) => Uuid::parse_str(&token.claims.sub).map_err(|_| {
            crate::error::HttpError::unauthorized(
                crate::error::ErrorMessage::InvalidToken.to_string(),
            )
        }),
        Err(_) => Err(crate::error::HttpError::unauthorized(
            crate::error::ErrorMessage::InvalidToken.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::User,
            status: UserStatus::Active,
            is_new: true,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_user_id() {
        let user = sample_user();
        let token = create_token(&user, b"secret", 3600).unwrap();
        let decoded = decode_token(token, b"secret").unwrap();
        assert_eq!(decoded, user.id);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let user = sample_user();
        let token = create_token(&user, b"secret", 3600).unwrap();
        assert!(decode_token(token, b"other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let user = sample_user();
        let token = create_token(&user, b"secret", -10).unwrap();
        assert!(decode_token(token, b"secret").is_err());
    }
}
