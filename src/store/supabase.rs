//! Supabase REST and auth API client
//!
//! Table reads and writes go through PostgREST with the service_role key.
//! Auth calls (user lookup, PKCE code exchange) go through GoTrue with the
//! anon key, acting on behalf of the user whose token is passed in.

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Query-string parameters in PostgREST form, e.g. `("id", "eq.<uuid>")`
pub type Query<'a> = [(&'a str, String)];

/// Supabase client for server-side database and auth operations
/// Uses service_role key for tables, which bypasses RLS - handle with care!
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    /// Get the REST API URL for a table, with the query string appended
    fn rest_url(&self, table: &str, query: &Query<'_>) -> Result<Url, SupabaseError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .map_err(|_| SupabaseError::InvalidUrl(self.base_url.clone()))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Attach service_role credentials
    fn service(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.rest_url(table, query)?;

        let response = self
            .service(self.client.get(url))
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Make an authenticated GET request expecting a single row
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Option<T>, SupabaseError> {
        let url = self.rest_url(table, query)?;

        let response = self
            .service(self.client.get(url))
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        if response.status() == StatusCode::NOT_ACCEPTABLE {
            // No rows found
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        response.json().await.map(Some).map_err(SupabaseError::Parse)
    }

    /// Make an authenticated POST request (insert)
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let url = self.rest_url(table, &[])?;

        let response = self
            .service(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// Make an authenticated PATCH request (update), returning updated rows
    pub async fn update<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
        data: &T,
    ) -> Result<Vec<R>, SupabaseError> {
        let url = self.rest_url(table, query)?;

        let response = self
            .service(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Make an authenticated DELETE request, returning the deleted rows
    pub async fn delete<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<R>, SupabaseError> {
        let url = self.rest_url(table, query)?;

        let response = self
            .service(self.client.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Call a Postgres function exposed through PostgREST. The result body is discarded.
    pub async fn rpc<T: Serialize>(&self, function: &str, args: &T) -> Result<(), SupabaseError> {
        let url = self.rest_url(&format!("rpc/{}", function), &[])?;

        let response = self
            .service(self.client.post(url))
            .json(args)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        ensure_success(response).await?;
        Ok(())
    }

    /// Look up the user behind an access token, including enrolled MFA factors
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Exchange an OAuth authorization code for a session (PKCE flow)
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, SupabaseError> {
        #[derive(Serialize)]
        struct PkceGrant<'a> {
            auth_code: &'a str,
            code_verifier: &'a str,
        }

        let response = self
            .client
            .post(self.auth_url("token?grant_type=pkce"))
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&PkceGrant {
                auth_code,
                code_verifier,
            })
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = ensure_success(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }
}

async fn ensure_success(response: Response) -> Result<Response, SupabaseError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::Api {
        status: status.as_u16(),
        body,
    })
}

/// User record from the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub factors: Vec<AuthFactor>,
}

/// Enrolled MFA factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFactor {
    pub id: Uuid,
    #[serde(default)]
    pub factor_type: Option<String>,
    pub status: String,
}

impl AuthFactor {
    pub fn is_verified(&self) -> bool {
        self.status == "verified"
    }
}

/// Session returned by a token grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,

    #[error("Invalid Supabase URL: {0}")]
    InvalidUrl(String),
}

/// Quote a value for use inside a PostgREST array literal, e.g. `{"UI Design",Figma}`
pub fn array_literal(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Quote a list for a PostgREST `in.(...)` filter
pub fn in_list(values: &[Uuid]) -> String {
    let items: Vec<String> = values.iter().map(Uuid::to_string).collect();
    format!("in.({})", items.join(","))
}
