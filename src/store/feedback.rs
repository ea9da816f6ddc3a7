//! Feedback chips, comments and per-user counts

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{in_list, SupabaseClient, SupabaseError};

pub const MAX_CHIPS_PER_FEEDBACK: usize = 5;
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackChip {
    pub id: Uuid,
    pub label: String,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioFeedback {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub chip_ids: Vec<Uuid>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub author_id: Uuid,
    pub chip_ids: Vec<Uuid>,
    pub comment: Option<String>,
}

/// Chip selection plus optional comment, as sent by the feedback form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub chip_ids: Vec<Uuid>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl FeedbackSubmission {
    /// Dedupe chips (keeping order), trim the comment, enforce limits.
    pub fn normalize(self) -> Result<(Vec<Uuid>, Option<String>), String> {
        let mut chip_ids: Vec<Uuid> = Vec::with_capacity(self.chip_ids.len());
        for id in self.chip_ids {
            if !chip_ids.contains(&id) {
                chip_ids.push(id);
            }
        }
        if chip_ids.len() > MAX_CHIPS_PER_FEEDBACK {
            return Err(format!(
                "At most {} feedback chips may be selected",
                MAX_CHIPS_PER_FEEDBACK
            ));
        }

        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(c) = &comment {
            if c.chars().count() > MAX_COMMENT_CHARS {
                return Err(format!(
                    "Comment must be at most {} characters",
                    MAX_COMMENT_CHARS
                ));
            }
        }

        if chip_ids.is_empty() && comment.is_none() {
            return Err("Select at least one chip or write a comment".to_string());
        }

        Ok((chip_ids, comment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipTally {
    pub chip_id: Uuid,
    pub label: String,
    pub polarity: Polarity,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentEntry {
    pub author_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackSummary {
    pub portfolio_id: Uuid,
    pub total_entries: usize,
    pub positive: u64,
    pub negative: u64,
    pub chips: Vec<ChipTally>,
    pub comments: Vec<CommentEntry>,
}

impl FeedbackSummary {
    /// Aggregate raw feedback rows. Chip ids missing from `catalogue` are skipped.
    pub fn build(
        portfolio_id: Uuid,
        catalogue: &[FeedbackChip],
        entries: &[PortfolioFeedback],
    ) -> Self {
        let by_id: HashMap<Uuid, &FeedbackChip> = catalogue.iter().map(|c| (c.id, c)).collect();
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for entry in entries {
            for chip_id in &entry.chip_ids {
                if by_id.contains_key(chip_id) {
                    *counts.entry(*chip_id).or_default() += 1;
                }
            }
        }

        let mut chips: Vec<ChipTally> = counts
            .into_iter()
            .filter_map(|(id, count)| {
                by_id.get(&id).map(|chip| ChipTally {
                    chip_id: id,
                    label: chip.label.clone(),
                    polarity: chip.polarity,
                    count,
                })
            })
            .collect();
        chips.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        let positive: u64 = chips
            .iter()
            .filter(|c| c.polarity == Polarity::Positive)
            .map(|c| c.count)
            .sum();
        let negative: u64 = chips
            .iter()
            .filter(|c| c.polarity == Polarity::Negative)
            .map(|c| c.count)
            .sum();

        let mut comments: Vec<CommentEntry> = entries
            .iter()
            .filter_map(|e| {
                e.comment.as_ref().map(|c| CommentEntry {
                    author_id: e.author_id,
                    comment: c.clone(),
                    created_at: e.created_at,
                })
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            portfolio_id,
            total_entries: entries.len(),
            positive,
            negative,
            chips,
            comments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedbackCountRow {
    feedback_count: i64,
}

#[derive(Clone)]
pub struct FeedbackStore {
    client: SupabaseClient,
}

impl FeedbackStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn list_chips(&self) -> Result<Vec<FeedbackChip>, SupabaseError> {
        self.client
            .get("feedback_chips", &[("order", "label.asc".to_string())])
            .await
    }

    pub async fn get_chips(&self, ids: &[Uuid]) -> Result<Vec<FeedbackChip>, SupabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .get("feedback_chips", &[("id", in_list(ids))])
            .await
    }

    pub async fn insert(&self, feedback: &NewFeedback) -> Result<PortfolioFeedback, SupabaseError> {
        self.client.insert("portfolio_feedback", feedback).await
    }

    pub async fn list_for_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<PortfolioFeedback>, SupabaseError> {
        self.client
            .get(
                "portfolio_feedback",
                &[
                    ("portfolio_id", format!("eq.{}", portfolio_id)),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await
    }

    /// Feedback the user has given. No row yet means zero.
    pub async fn feedback_count(&self, user_id: Uuid) -> Result<i64, SupabaseError> {
        let row: Option<FeedbackCountRow> = self
            .client
            .get_one(
                "user_feedback_count",
                &[
                    ("user_id", format!("eq.{}", user_id)),
                    ("select", "feedback_count".to_string()),
                ],
            )
            .await?;
        Ok(row.map(|r| r.feedback_count).unwrap_or(0))
    }
}
