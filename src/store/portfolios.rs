//! Portfolio rows: creation, publishing, review and draft cleanup

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_TOOLS: usize = 10;
pub const MAX_TOOL_CHARS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    pub is_public: bool,
    pub status: PortfolioStatus,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    /// Shown in the public gallery
    pub fn is_listed(&self) -> bool {
        self.is_public
            && self.status == PortfolioStatus::Published
            && self.approval_status == ApprovalStatus::Approved
    }

    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_listed()
    }
}

/// Row for insertion
#[derive(Debug, Clone, Serialize)]
pub struct NewPortfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tools: Vec<String>,
    pub is_public: bool,
    pub status: PortfolioStatus,
    pub approval_status: ApprovalStatus,
}

/// Unvalidated upload form contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioSubmission {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub publish: bool,
}

fn default_public() -> bool {
    true
}

impl PortfolioSubmission {
    /// Normalise and check the submission, producing a row owned by `user_id`.
    pub fn into_new_portfolio(self, user_id: Uuid) -> Result<NewPortfolio, String> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(format!("Title must be at most {} characters", MAX_TITLE_CHARS));
        }

        let description = non_empty(self.description);
        if let Some(d) = &description {
            if d.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(format!(
                    "Description must be at most {} characters",
                    MAX_DESCRIPTION_CHARS
                ));
            }
        }

        let tools = normalize_tools(self.tools)?;

        let status = if self.publish {
            PortfolioStatus::Published
        } else {
            PortfolioStatus::Draft
        };

        Ok(NewPortfolio {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            url: non_empty(self.url),
            thumbnail_url: non_empty(self.thumbnail_url),
            tools,
            is_public: self.is_public,
            status,
            approval_status: ApprovalStatus::Pending,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim and dedupe case-insensitively (first spelling wins). Blank names are an error.
pub fn normalize_tools(tools: Vec<String>) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::new();
    for tool in tools {
        let tool = tool.trim();
        if tool.is_empty() {
            return Err("Tool names cannot be blank".to_string());
        }
        if tool.chars().count() > MAX_TOOL_CHARS {
            return Err(format!("Tool names must be at most {} characters", MAX_TOOL_CHARS));
        }
        if out.iter().any(|t| t.eq_ignore_ascii_case(tool)) {
            continue;
        }
        out.push(tool.to_string());
    }
    if out.len() > MAX_TOOLS {
        return Err(format!("At most {} tools may be tagged", MAX_TOOLS));
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: PortfolioStatus,
    approval_status: ApprovalStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ApprovalUpdate {
    approval_status: ApprovalStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PortfolioStore {
    client: SupabaseClient,
}

impl PortfolioStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, portfolio: &NewPortfolio) -> Result<Portfolio, SupabaseError> {
        self.client.insert("portfolios", portfolio).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Portfolio>, SupabaseError> {
        self.client
            .get_one("portfolios", &[("id", format!("eq.{}", id))])
            .await
    }

    /// Move a draft into the review queue. `None` if the row was not a draft.
    pub async fn publish(&self, id: Uuid) -> Result<Option<Portfolio>, SupabaseError> {
        let rows: Vec<Portfolio> = self
            .client
            .update(
                "portfolios",
                &[
                    ("id", format!("eq.{}", id)),
                    ("status", "eq.draft".to_string()),
                ],
                &StatusUpdate {
                    status: PortfolioStatus::Published,
                    approval_status: ApprovalStatus::Pending,
                    updated_at: Utc::now(),
                },
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn set_approval(
        &self,
        id: Uuid,
        approval_status: ApprovalStatus,
    ) -> Result<Option<Portfolio>, SupabaseError> {
        let rows: Vec<Portfolio> = self
            .client
            .update(
                "portfolios",
                &[
                    ("id", format!("eq.{}", id)),
                    ("status", "eq.published".to_string()),
                ],
                &ApprovalUpdate {
                    approval_status,
                    updated_at: Utc::now(),
                },
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Published portfolios awaiting review, oldest first
    pub async fn list_pending(&self) -> Result<Vec<Portfolio>, SupabaseError> {
        self.client
            .get(
                "portfolios",
                &[
                    ("status", "eq.published".to_string()),
                    ("approval_status", "eq.pending".to_string()),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await
    }

    /// Delete the user's drafts last touched before `cutoff`
    pub async fn delete_stale_drafts(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, SupabaseError> {
        let rows: Vec<IdRow> = self
            .client
            .delete(
                "portfolios",
                &[
                    ("user_id", format!("eq.{}", user_id)),
                    ("status", "eq.draft".to_string()),
                    (
                        "updated_at",
                        format!("lt.{}", cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ),
                    ("select", "id".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Delete one draft belonging to the user, whatever its age
    pub async fn delete_draft(&self, user_id: Uuid, id: Uuid) -> Result<Vec<Uuid>, SupabaseError> {
        let rows: Vec<IdRow> = self
            .client
            .delete(
                "portfolios",
                &[
                    ("id", format!("eq.{}", id)),
                    ("user_id", format!("eq.{}", user_id)),
                    ("status", "eq.draft".to_string()),
                    ("select", "id".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(title: &str) -> PortfolioSubmission {
        PortfolioSubmission {
            title: title.to_string(),
            is_public: true,
            ..Default::default()
        }
    }

    #[test]
    fn draft_by_default() {
        let row = submission("  Brand refresh  ")
            .into_new_portfolio(Uuid::nil())
            .unwrap();
        assert_eq!(row.title, "Brand refresh");
        assert_eq!(row.status, PortfolioStatus::Draft);
        assert_eq!(row.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn publish_flag_enters_review() {
        let mut s = submission("App");
        s.publish = true;
        let row = s.into_new_portfolio(Uuid::nil()).unwrap();
        assert_eq!(row.status, PortfolioStatus::Published);
        assert_eq!(row.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn blank_title_rejected() {
        assert!(submission("   ").into_new_portfolio(Uuid::nil()).is_err());
    }

    #[test]
    fn long_title_rejected() {
        let title = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(submission(&title).into_new_portfolio(Uuid::nil()).is_err());
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut s = submission("Site");
        s.description = Some("  ".to_string());
        s.url = Some(String::new());
        let row = s.into_new_portfolio(Uuid::nil()).unwrap();
        assert!(row.description.is_none());
        assert!(row.url.is_none());
    }

    #[test]
    fn tools_are_trimmed_and_deduped() {
        let tools = normalize_tools(vec![
            " Figma ".to_string(),
            "figma".to_string(),
            "React".to_string(),
        ])
        .unwrap();
        assert_eq!(tools, vec!["Figma".to_string(), "React".to_string()]);
    }

    #[test]
    fn blank_tool_rejected() {
        let err = normalize_tools(vec!["Figma".to_string(), "   ".to_string()]).unwrap_err();
        assert!(err.contains("blank"));
    }

    #[test]
    fn long_tool_name_rejected() {
        let ok = "t".repeat(MAX_TOOL_CHARS);
        assert_eq!(normalize_tools(vec![ok.clone()]).unwrap(), vec![ok]);

        let err = normalize_tools(vec!["t".repeat(MAX_TOOL_CHARS + 1)]).unwrap_err();
        assert!(err.contains("at most"));
    }

    #[test]
    fn long_description_rejected() {
        let mut s = submission("Site");
        s.description = Some("d".repeat(MAX_DESCRIPTION_CHARS));
        assert!(s.clone().into_new_portfolio(Uuid::nil()).is_ok());

        s.description = Some("d".repeat(MAX_DESCRIPTION_CHARS + 1));
        let err = s.into_new_portfolio(Uuid::nil()).unwrap_err();
        assert!(err.contains("Description"));
    }

    #[test]
    fn too_many_tools_rejected() {
        let tools: Vec<String> = (0..=MAX_TOOLS).map(|i| format!("tool-{}", i)).collect();
        assert!(normalize_tools(tools).is_err());
    }

    #[test]
    fn listing_requires_public_published_approved() {
        let mut p = Portfolio {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            url: None,
            thumbnail_url: None,
            tools: vec![],
            is_public: true,
            status: PortfolioStatus::Published,
            approval_status: ApprovalStatus::Approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(p.is_listed());
        assert!(p.visible_to(Uuid::new_v4()));

        p.approval_status = ApprovalStatus::Pending;
        assert!(!p.is_listed());
        assert!(!p.visible_to(Uuid::new_v4()));
        assert!(p.visible_to(p.user_id));
    }
}
