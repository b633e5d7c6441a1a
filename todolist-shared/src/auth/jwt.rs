/// Identity token issuing and verification
///
/// Tokens are HS256 (HMAC-SHA256) JWTs carrying the caller's user id and email.
/// They expire one day after issuance. The signing secret is process-wide
/// configuration handed to [`TokenCodec::new`] once at startup.
///
/// # Claims
///
/// - `id`: User ID
/// - `email`: User email at issuance
/// - `iss`: Always "todolist"
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use todolist_shared::auth::jwt::TokenCodec;
/// use todolist_shared::auth::middleware::Identity;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = TokenCodec::new("your-secret-key-at-least-32-bytes-long");
/// let identity = Identity::new(Uuid::new_v4(), "a@x.com");
///
/// let token = codec.issue(&identity)?;
/// let verified = codec.verify(&token)?;
/// assert_eq!(verified, identity);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::middleware::Identity;

/// Issuer written into and required from every token
pub const TOKEN_ISSUER: &str = "todolist";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, issuer or structure check failed
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: Uuid,

    /// User email
    pub email: String,

    /// Issuer - Always "todolist"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an identity, valid for `ttl` from now
    pub fn for_identity(identity: &Identity, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: identity.user_id,
            email: identity.email.clone(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs and verifies identity tokens with a single process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Token lifetime, fixed at one day
    pub fn token_ttl() -> Duration {
        Duration::days(1)
    }

    /// Builds a codec from the signing secret
    ///
    /// The secret should be at least 32 bytes; configuration loading enforces that.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a signed token for `identity`, expiring one day from now
    pub fn issue(&self, identity: &Identity) -> Result<String, JwtError> {
        self.issue_with_ttl(identity, Self::token_ttl())
    }

    /// Issues a signed token with an explicit lifetime
    pub fn issue_with_ttl(&self, identity: &Identity, ttl: Duration) -> Result<String, JwtError> {
        let claims = Claims::for_identity(identity, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns the identity it carries
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` if the token is past its `exp`
    /// - `JwtError::Invalid` for bad signatures, wrong issuer or malformed input
    ///
    /// Callers must not surface the difference to clients.
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        Ok(Identity::new(data.claims.id, data.claims.email))
    }
}
