use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::state::AppState;
use crate::users::profile::{ensure_profile, IdentityClaims};

/// POST /api/v1/users/sync
///
/// Called after sign-in. 201 when the profile was just created, 200 otherwise.
pub async fn handle_sync_user(
    State(state): State<AppState>,
    Json(claims): Json<IdentityClaims>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let (profile, created) = ensure_profile(state.store.as_ref(), &claims).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(profile)))
}
