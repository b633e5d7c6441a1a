/// Request extractors
///
/// Each extractor rejects with [`ApiError`] so malformed input renders with the
/// same `{success: false, message}` body as every other failure.
///
/// - [`ValidatedJson`]: JSON body that also passes `validator` rules
/// - [`Pagination`]: `pageNumber` / `itemsPerPage` query parameters
/// - [`Scope`]: path identifiers in route order, as a [`ResourcePath`]

use axum::{
    async_trait,
    extract::{
        rejection::PathRejection, FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use todolist_shared::{ownership::ResourcePath, pagination::PageQuery};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// JSON body deserialized and validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Raw page parameters from the query string
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination(pub PageQuery);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(query))
    }
}

/// Path identifiers of the matched route
///
/// An identifier that is not a UUID cannot name an existing resource, so it
/// resolves to 404 rather than 400.
#[derive(Debug, Clone, Default)]
pub struct Scope(pub ResourcePath);

#[async_trait]
impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = match Path::<Vec<(String, String)>>::from_request_parts(parts, state).await {
            Ok(Path(params)) => params,
            Err(PathRejection::MissingPathParams(_)) => Vec::new(),
            Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
        };

        let ids = params
            .iter()
            .map(|(name, value)| {
                Uuid::parse_str(value).map_err(|_| {
                    tracing::debug!(param = %name, value = %value, "Path identifier is not a UUID");
                    ApiError::NotFound("Resource not found".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(ResourcePath::new(ids)))
    }
}
