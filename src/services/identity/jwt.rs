use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::model::Account;
use crate::services::identity::verifier::{IdentityVerifier, VerifierError};

/// Bearer token claims. The identity service embeds the whole account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub account: Account,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

/// HS256 bearer-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtIdentityVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and `exp`, then check the account claim is usable.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, VerifierError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.account.username.trim().is_empty() {
            return Err(VerifierError::EmptyClaim("account.username"));
        }
        if claims.exp == 0 {
            return Err(VerifierError::EmptyClaim("exp"));
        }

        Ok(claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    fn backend_name(&self) -> &'static str {
        "jwt-hs256"
    }

    async fn validate(&self, token: &str) -> Result<Account, VerifierError> {
        self.verify(token).map(|claims| claims.account)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jsonwebtoken::{EncodingKey, Header, get_current_timestamp};

    use super::*;

    pub(crate) const SECRET: &str = "test-secret-test-secret-test-secret";

    pub(crate) fn sign(account: &Account, exp: u64, secret: &str) -> String {
        let claims = AccessTokenClaims {
            account: account.clone(),
            exp,
            iat: Some(get_current_timestamp()),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("signing should succeed")
    }

    pub(crate) fn valid_token(account: &Account) -> String {
        sign(account, get_current_timestamp() + 3600, SECRET)
    }

    #[tokio::test]
    async fn test_validate_valid_token_returns_account() {
        let verifier = JwtIdentityVerifier::new(SECRET, 0);
        let account = Account::new(7, "owner", true);

        let resolved = verifier
            .validate(&valid_token(&account))
            .await
            .expect("token should verify");

        assert_eq!(resolved, account);
    }

    #[tokio::test]
    async fn test_validate_expired_token_fails() {
        let verifier = JwtIdentityVerifier::new(SECRET, 0);
        let token = sign(
            &Account::new(7, "owner", true),
            get_current_timestamp() - 600,
            SECRET,
        );

        assert!(matches!(
            verifier.validate(&token).await,
            Err(VerifierError::Jwt(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_wrong_secret_fails() {
        let verifier = JwtIdentityVerifier::new(SECRET, 0);
        let token = sign(
            &Account::new(7, "owner", true),
            get_current_timestamp() + 600,
            "some-other-secret-some-other-secret",
        );

        assert!(verifier.validate(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_garbage_fails() {
        let verifier = JwtIdentityVerifier::new(SECRET, 0);

        assert!(verifier.validate("badtoken").await.is_err());
    }

    #[tokio::test]
    async fn test_validate_empty_username_fails() {
        let verifier = JwtIdentityVerifier::new(SECRET, 0);
        let token = valid_token(&Account::new(7, "  ", true));

        assert!(matches!(
            verifier.validate(&token).await,
            Err(VerifierError::EmptyClaim("account.username"))
        ));
    }
}
