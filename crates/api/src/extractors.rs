//! Request extractors.
//!
//! The `Api*` wrappers behave like their axum counterparts but reject with
//! an [`ApiError`], so malformed input still gets the error envelope.

use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use scholaris_db::SchoolRepository;
use scholaris_db::entities::schools;

use crate::{ApiError, AppState};

/// JSON body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The active school named by `{school_id}` in the path.
///
/// Unknown, inactive or malformed ids are rejected with 404 so that
/// callers cannot tell them apart.
#[derive(Debug, Clone)]
pub struct Tenant {
    /// The school record.
    pub school: schools::Model,
}

impl Tenant {
    /// The school id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.school.id
    }
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state).await?;
        let raw = params
            .get("school_id")
            .ok_or_else(|| ApiError::not_found("School not found"))?;
        let school_id =
            Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("School not found: {raw}")))?;

        let school = SchoolRepository::new(state.conn()).find_active(school_id).await?;
        Ok(Self { school })
    }
}
