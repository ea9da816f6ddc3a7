//! Authenticator assurance levels (MFA)

use serde::{Deserialize, Serialize};

use super::supabase::{AuthUser, SupabaseClient, SupabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssuranceLevel {
    Aal1,
    Aal2,
}

impl AssuranceLevel {
    /// Parse the `aal` JWT claim. Anything unrecognised counts as single-factor.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("aal2") => AssuranceLevel::Aal2,
            _ => AssuranceLevel::Aal1,
        }
    }
}

/// Where the session is and where it can get to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssuranceLevels {
    pub current_level: AssuranceLevel,
    pub next_level: AssuranceLevel,
}

impl AssuranceLevels {
    pub fn compute(claim: Option<&str>, user: &AuthUser) -> Self {
        let next_level = if user.factors.iter().any(|f| f.is_verified()) {
            AssuranceLevel::Aal2
        } else {
            AssuranceLevel::Aal1
        };

        Self {
            current_level: AssuranceLevel::from_claim(claim),
            next_level,
        }
    }

    /// The user has a verified factor but this session has not used it yet
    pub fn verification_required(&self) -> bool {
        self.next_level == AssuranceLevel::Aal2 && self.current_level != AssuranceLevel::Aal2
    }
}

#[derive(Clone)]
pub struct MfaService {
    client: SupabaseClient,
}

impl MfaService {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn assurance_levels(
        &self,
        access_token: &str,
        aal_claim: Option<&str>,
    ) -> Result<AssuranceLevels, SupabaseError> {
        let user = self.client.get_user(access_token).await?;
        Ok(AssuranceLevels::compute(aal_claim, &user))
    }
}
