//! User profile lookups

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Profile store operations
#[derive(Clone)]
pub struct ProfileStore {
    client: SupabaseClient,
}

impl ProfileStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a user profile by ID
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, SupabaseError> {
        self.client
            .get_one("profiles", &[("id", format!("eq.{}", user_id))])
            .await
    }

    /// Whether the user carries the admin flag. A missing profile is not an admin.
    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool, SupabaseError> {
        Ok(self
            .get_profile(user_id)
            .await?
            .map(|p| p.is_admin)
            .unwrap_or(false))
    }
}
