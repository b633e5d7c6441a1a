/// Authentication utilities
///
/// # Modules
///
/// - [`jwt`]: Identity token issuing and verification (HS256, 1 day expiry)
/// - [`password`]: Opaque password hash/verify boundary with an Argon2id implementation
/// - [`middleware`]: Bearer token extraction and the identity middleware chain
///
/// # Example
///
/// ```
/// use todolist_shared::auth::jwt::TokenCodec;
/// use todolist_shared::auth::middleware::Identity;
/// use todolist_shared::auth::password::{Argon2Hasher, CredentialHasher};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::with_params(4096, 1, 1)?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash)?);
///
/// let codec = TokenCodec::new("secret-key-at-least-32-bytes-long!!");
/// let token = codec.issue(&Identity::new(Uuid::new_v4(), "user@example.com"))?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
