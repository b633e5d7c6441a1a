/// Password hashing behind an opaque hash/verify boundary
///
/// Handlers only see [`CredentialHasher`]; the concrete [`Argon2Hasher`] produces
/// Argon2id PHC strings. Verification reads the parameters embedded in the hash,
/// so hashes made with different settings remain verifiable.
///
/// # Example
///
/// ```
/// use todolist_shared::auth::password::{Argon2Hasher, CredentialHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::with_params(4096, 1, 1)?;
/// let hash = hasher.hash("pw123456")?;
///
/// assert!(hasher.verify("pw123456", &hash)?);
/// assert!(!hasher.verify("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way password hashing
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing string
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Checks a plaintext password against a stored hash
    ///
    /// Returns `Ok(false)` for a mismatch; errors are reserved for unreadable hashes.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id hasher
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Production parameters: 64 MiB, 3 passes, 4 lanes, 32-byte output
    pub fn new() -> Self {
        // Constant inputs that ParamsBuilder always accepts
        Self::with_params(65536, 3, 4).unwrap_or_else(|_| Self {
            params: Params::default(),
        })
    }

    /// Custom cost parameters (memory in KiB, passes, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        if !matches!(parsed.algorithm.as_str(), "argon2id" | "argon2i" | "argon2d") {
            return Err(PasswordError::InvalidHash(format!(
                "Unsupported algorithm: {}",
                parsed.algorithm
            )));
        }
        if parsed.hash.is_none() {
            return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
        }

        // Parameters come from the PHC string
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}
