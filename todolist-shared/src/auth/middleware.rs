/// Identity middleware for Axum
///
/// Every protected request passes through [`require_identity`]:
///
/// ```text
/// NoToken ──header present──> TokenPresent ──verify ok──> Verified  (Identity attached, next handler runs)
///    │                             │
///    └──────absent/malformed───────┴──verify failed──> Rejected (401, request ends here)
/// ```
///
/// A rejected request never reaches a resource handler. The response is the same
/// 401 body whether the token was missing, malformed, forged or expired.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use todolist_shared::auth::jwt::TokenCodec;
/// use todolist_shared::auth::middleware::{require_identity, AuthGuard, Identity};
///
/// async fn whoami(identity: Identity) -> String {
///     identity.email
/// }
///
/// let guard = AuthGuard::new(TokenCodec::new("your-secret-key-at-least-32-bytes-long"));
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(guard, require_identity));
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{JwtError, TokenCodec};

/// Caller identity reconstructed from a verified token
///
/// Added to request extensions by [`require_identity`] and extractable in handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email embedded in the token
    pub email: String,
}

impl Identity {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(&'static str),

    /// Token failed verification
    #[error(transparent)]
    InvalidToken(#[from] JwtError),

    /// Valid token presented to an anonymous-only route in strict mode
    #[error("Already authenticated")]
    AlreadyAuthenticated,
}

impl AuthError {
    /// Status code for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::AlreadyAuthenticated => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message; authentication details are never exposed
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::AlreadyAuthenticated => "Already authenticated",
            _ => "Unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Request rejected by identity middleware");

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (self.status(), body).into_response()
    }
}

/// Extracts the bearer token from the Authorization header
///
/// # Errors
///
/// - `MissingCredentials` if the header is absent
/// - `InvalidFormat` if it is not valid ASCII, lacks the `Bearer ` prefix, or has no token
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("header is not valid ASCII"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat("expected Bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("empty Bearer token"));
    }

    Ok(token)
}

/// Shared state for the identity middleware
#[derive(Debug, Clone)]
pub struct AuthGuard {
    codec: Arc<TokenCodec>,
    reject_authenticated: bool,
}

impl AuthGuard {
    /// Creates a guard whose anonymous-only routes let authenticated callers through
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            codec: Arc::new(codec),
            reject_authenticated: false,
        }
    }

    /// Makes [`deny_if_authenticated`] reject callers carrying a valid token
    pub fn reject_authenticated(mut self, reject: bool) -> Self {
        self.reject_authenticated = reject;
        self
    }

    /// Token codec used for verification and issuing
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Runs the full NoToken → TokenPresent → Verified/Rejected transition
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = bearer_token(headers)?;
        let identity = self.codec.verify(token)?;
        Ok(identity)
    }
}

/// Middleware for protected routes
///
/// On success inserts [`Identity`] into request extensions and runs the next
/// handler. On failure responds 401 immediately.
pub async fn require_identity(
    State(guard): State<AuthGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = guard.authenticate(req.headers())?;

    tracing::debug!(user_id = %identity.user_id, "Request authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Middleware for anonymous-only routes (registration, login)
///
/// A pass-through unless the guard was built with `reject_authenticated(true)`,
/// in which case a request with a valid token fails with `AlreadyAuthenticated`.
/// Missing or invalid tokens are ignored here.
pub async fn deny_if_authenticated(
    State(guard): State<AuthGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if guard.reject_authenticated && guard.authenticate(req.headers()).is_ok() {
        return Err(AuthError::AlreadyAuthenticated);
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::HeaderValue, middleware, routing::get, Router};
    use tower::Service;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn whoami(identity: Identity) -> String {
        identity.user_id.to_string()
    }

    fn protected_app(guard: AuthGuard) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(guard, require_identity))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_bearer_token_malformed() {
        for value in ["Basic abc", "Bearer", "Bearer ", "Bearer    ", "bearer abc", "abc"] {
            assert!(
                matches!(bearer_token(&headers_with(value)), Err(AuthError::InvalidFormat(_))),
                "'{}' should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_authenticate_round_trip() {
        let guard = AuthGuard::new(TokenCodec::new(SECRET));
        let identity = Identity::new(Uuid::new_v4(), "a@x.com");
        let token = guard.codec().issue(&identity).unwrap();

        let resolved = guard
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(resolved, identity);
    }

    #[test]
    fn test_auth_error_responses_are_uniform() {
        let errors = vec![
            AuthError::MissingCredentials,
            AuthError::InvalidFormat("expected Bearer token"),
            AuthError::InvalidToken(JwtError::Expired),
            AuthError::InvalidToken(JwtError::Invalid("bad signature".to_string())),
        ];

        for err in errors {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "Unauthorized");
        }

        assert_eq!(AuthError::AlreadyAuthenticated.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_identity_attaches_identity() {
        let guard = AuthGuard::new(TokenCodec::new(SECRET));
        let identity = Identity::new(Uuid::new_v4(), "a@x.com");
        let token = guard.codec().issue(&identity).unwrap();

        let request = Request::builder()
            .uri("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = protected_app(guard).call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, identity.user_id.to_string());
    }

    #[tokio::test]
    async fn test_require_identity_rejects_without_forwarding() {
        let guard = AuthGuard::new(TokenCodec::new(SECRET));
        let foreign = TokenCodec::new("another-secret-key-at-least-32-bytes")
            .issue(&Identity::new(Uuid::new_v4(), "a@x.com"))
            .unwrap();

        for header_value in [None, Some("Token abc".to_string()), Some(format!("Bearer {}", foreign))] {
            let mut builder = Request::builder().uri("/whoami");
            if let Some(value) = header_value {
                builder = builder.header("authorization", value);
            }

            let response = protected_app(guard.clone())
                .call(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_identity_extractor_without_middleware() {
        let mut app: Router = Router::new().route("/whoami", get(whoami));

        let response = app
            .call(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deny_if_authenticated_modes() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(&Identity::new(Uuid::new_v4(), "a@x.com")).unwrap();

        let app = |guard: AuthGuard| -> Router {
            Router::new()
                .route("/login", get(|| async { "ok" }))
                .layer(middleware::from_fn_with_state(guard, deny_if_authenticated))
        };
        let request = || {
            Request::builder()
                .uri("/login")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap()
        };

        let lenient = AuthGuard::new(codec.clone());
        let response = app(lenient).call(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let strict = AuthGuard::new(codec.clone()).reject_authenticated(true);
        let response = app(strict.clone()).call(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Anonymous callers still pass in strict mode
        let response = app(strict)
            .call(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
