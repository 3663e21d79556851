// Identity verification for the admin channel.
//
// The provider itself is behind the IdentityClient port; this service only
// decides whether a verified username is allowed to moderate. The allow-list
// is handed in at construction - nothing here reads process-wide state.

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed authorization header")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Access denied for @{0}. You are not authorized.")]
    NotAuthorized(String),
}

// ============================================================================
// IDENTITY TRAIT (PORT)
// ============================================================================

/// Trait for exchanging a bearer credential for a verified username.
///
/// Called once per privileged request; implementations are stateless.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Verifies a bearer credential and checks the resulting username against
/// the configured allow-list.
pub struct AuthService<C: IdentityClient> {
    client: C,
    allowed_users: Vec<String>,
}

impl<C: IdentityClient> AuthService<C> {
    /// `allowed_users` is compared case-insensitively; it is lowercased
    /// once here so every later check is a plain contains.
    pub fn new(client: C, allowed_users: Vec<String>) -> Self {
        let allowed_users = allowed_users
            .into_iter()
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        Self {
            client,
            allowed_users,
        }
    }

    /// Resolve a token to a username and authorize it.
    ///
    /// An empty allow-list admits any verified identity. This permissive
    /// default is deliberate and must be preserved.
    pub async fn authorize(&self, token: &str) -> Result<String, AuthError> {
        let username = self.client.verify(token).await?;

        if !self.allowed_users.is_empty()
            && !self.allowed_users.contains(&username.to_lowercase())
        {
            return Err(AuthError::NotAuthorized(username));
        }

        Ok(username)
    }
}
