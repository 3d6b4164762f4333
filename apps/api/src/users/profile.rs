use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::validation::require_user_id;
use crate::models::user::UserProfile;
use crate::store::RecordStore;

const ANONYMOUS_NAME: &str = "Anonymous";
const MISSING_EMAIL: &str = "N/A";

/// What the identity provider knows about the signed-in user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl IdentityClaims {
    fn to_profile(&self) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            id: self.id.clone(),
            name: non_blank(&self.full_name)
                .or_else(|| non_blank(&self.first_name))
                .unwrap_or(ANONYMOUS_NAME)
                .to_string(),
            email: non_blank(&self.email).unwrap_or(MISSING_EMAIL).to_string(),
            image_url: non_blank(&self.image_url).map(String::from),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Writes the user's profile on first sign-in. An existing profile is returned
/// untouched. The flag reports whether this call created it.
pub async fn ensure_profile(
    store: &dyn RecordStore,
    claims: &IdentityClaims,
) -> Result<(UserProfile, bool), AppError> {
    require_user_id(&claims.id)?;

    if let Some(existing) = store.get_user(&claims.id).await? {
        return Ok((existing, false));
    }

    let profile = claims.to_profile();
    if store.create_user(&profile).await? {
        info!("Mirrored new user profile {}", profile.id);
        return Ok((profile, true));
    }

    // lost a race with a concurrent sign-in
    let existing = store.get_user(&claims.id).await?.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "User {} vanished after insert conflict",
            claims.id
        ))
    })?;
    Ok((existing, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRecordStore;

    fn claims(id: &str) -> IdentityClaims {
        IdentityClaims {
            id: id.to_string(),
            full_name: None,
            first_name: None,
            email: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_profile_with_fallbacks() {
        let store = MemoryRecordStore::new();
        let (profile, created) = ensure_profile(&store, &claims("user_1")).await.unwrap();

        assert!(created);
        assert_eq!(profile.name, "Anonymous");
        assert_eq!(profile.email, "N/A");
        assert!(profile.image_url.is_none());
        assert!(store.get_user("user_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_name_prefers_full_then_first() {
        let store = MemoryRecordStore::new();
        let with_first = IdentityClaims {
            first_name: Some("Ada".to_string()),
            ..claims("user_1")
        };
        let (profile, _) = ensure_profile(&store, &with_first).await.unwrap();
        assert_eq!(profile.name, "Ada");

        let with_full = IdentityClaims {
            full_name: Some("Grace Hopper".to_string()),
            first_name: Some("Grace".to_string()),
            ..claims("user_2")
        };
        let (profile, _) = ensure_profile(&store, &with_full).await.unwrap();
        assert_eq!(profile.name, "Grace Hopper");
    }

    #[tokio::test]
    async fn test_existing_profile_is_not_overwritten() {
        let store = MemoryRecordStore::new();
        let original = IdentityClaims {
            email: Some("ada@example.com".to_string()),
            ..claims("user_1")
        };
        ensure_profile(&store, &original).await.unwrap();

        let changed = IdentityClaims {
            email: Some("new@example.com".to_string()),
            ..claims("user_1")
        };
        let (profile, created) = ensure_profile(&store, &changed).await.unwrap();
        assert!(!created);
        assert_eq!(profile.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_blank_id_is_rejected() {
        let store = MemoryRecordStore::new();
        let result = ensure_profile(&store, &claims("  ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
