//! JWT token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use cluehunt_core::db::unix_timestamp;

use super::claims::Claims;

/// Manages bearer token creation and validation.
///
/// Issuance lives here so the platform's login flow and the gateway share
/// one token format; the gateway itself only ever validates.
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

impl TokenManager {
    /// Create a new `TokenManager` with the given secret.
    pub fn new(secret: &[u8], token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl_secs,
        }
    }

    /// Issue a token for the given player.
    pub fn issue_token(
        &self,
        account_id: &str,
        username: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_timestamp();

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: account_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_tokens() -> TokenManager {
        TokenManager::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate_token() {
        let tokens = test_tokens();
        let token = tokens.issue_token("acct-1", "alice").unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, "acct-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn invalid_token_fails_validation() {
        let tokens = test_tokens();
        assert!(tokens.validate("not-a-valid-token").is_err());
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let tokens1 = test_tokens();
        let tokens2 = TokenManager::new(b"different-secret", 3600);

        let token = tokens1.issue_token("acct-1", "alice").unwrap();
        assert!(tokens2.validate(&token).is_err());
    }

    #[test]
    fn tokens_carry_unique_ids() {
        let tokens = test_tokens();
        let a = tokens.issue_token("acct-1", "alice").unwrap();
        let b = tokens.issue_token("acct-1", "alice").unwrap();

        let ca = tokens.validate(&a).unwrap();
        let cb = tokens.validate(&b).unwrap();
        assert_ne!(ca.jti, cb.jti);
    }
}
