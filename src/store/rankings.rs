//! Ranked gallery reads and the manual refresh RPC

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::portfolios::Portfolio;
use super::supabase::{array_literal, SupabaseClient, SupabaseError};

/// Postgres function that refreshes the rankings materialized view
pub const REFRESH_RANKINGS_RPC: &str = "refresh_portfolio_rankings_manual";

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Week,
    Month,
    #[default]
    AllTime,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::AllTime => "all_time",
        }
    }
}

/// A rankings row with its portfolio embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPortfolio {
    pub portfolio_id: Uuid,
    pub rank: i64,
    pub vote_count: i64,
    pub time_window: TimeWindow,
    #[serde(rename(deserialize = "portfolios"))]
    pub portfolio: Portfolio,
}

/// One page of the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    pub time_window: TimeWindow,
    pub tools: Vec<String>,
    pub page: usize,
    pub page_size: usize,
}

impl GalleryQuery {
    pub fn new(
        time_window: TimeWindow,
        tools: Vec<String>,
        page: usize,
        page_size: Option<usize>,
    ) -> Self {
        Self {
            time_window,
            tools,
            page,
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// PostgREST filters. Fetches one row past the page to detect more results.
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            (
                "select",
                "portfolio_id,rank,vote_count,time_window,portfolios!inner(*)".to_string(),
            ),
            ("time_window", format!("eq.{}", self.time_window.as_str())),
            ("portfolios.is_public", "eq.true".to_string()),
            ("portfolios.status", "eq.published".to_string()),
            ("portfolios.approval_status", "eq.approved".to_string()),
        ];
        if !self.tools.is_empty() {
            query.push(("portfolios.tools", format!("ov.{}", array_literal(&self.tools))));
        }
        query.push(("order", "rank.asc".to_string()));
        query.push(("offset", self.offset().to_string()));
        query.push(("limit", (self.page_size + 1).to_string()));
        query
    }
}

/// A fetched page plus whether another follows
#[derive(Debug, Clone)]
pub struct GalleryPage {
    pub items: Vec<RankedPortfolio>,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct RankingStore {
    client: SupabaseClient,
}

impl RankingStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn fetch_page(&self, query: &GalleryQuery) -> Result<GalleryPage, SupabaseError> {
        let mut items: Vec<RankedPortfolio> = self
            .client
            .get("portfolio_rankings", &query.to_query())
            .await?;

        let has_more = items.len() > query.page_size;
        items.truncate(query.page_size);
        Ok(GalleryPage { items, has_more })
    }

    pub async fn refresh(&self) -> Result<(), SupabaseError> {
        self.client
            .rpc(REFRESH_RANKINGS_RPC, &serde_json::json!({}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(GalleryQuery::new(TimeWindow::Week, vec![], 0, Some(0)).page_size, 1);
        assert_eq!(
            GalleryQuery::new(TimeWindow::Week, vec![], 0, Some(500)).page_size,
            MAX_PAGE_SIZE
        );
        assert_eq!(
            GalleryQuery::new(TimeWindow::Week, vec![], 0, None).page_size,
            DEFAULT_PAGE_SIZE
        );
    }

    #[test]
    fn query_fetches_one_extra_row() {
        let q = GalleryQuery::new(TimeWindow::Month, vec![], 2, Some(10));
        let query = q.to_query();
        assert_eq!(value(&query, "offset"), Some("20"));
        assert_eq!(value(&query, "limit"), Some("11"));
        assert_eq!(value(&query, "time_window"), Some("eq.month"));
        assert_eq!(value(&query, "order"), Some("rank.asc"));
        assert!(value(&query, "portfolios.tools").is_none());
    }

    #[test]
    fn tools_filter_uses_overlap() {
        let tools = vec!["Figma".to_string(), "UI Kit".to_string()];
        let q = GalleryQuery::new(TimeWindow::AllTime, tools, 0, None);
        let query = q.to_query();
        assert_eq!(
            value(&query, "portfolios.tools"),
            Some(r#"ov.{"Figma","UI Kit"}"#)
        );
    }

    #[test]
    fn time_window_defaults_to_all_time() {
        assert_eq!(TimeWindow::default(), TimeWindow::AllTime);
        let parsed: TimeWindow = serde_json::from_str("\"all_time\"").unwrap();
        assert_eq!(parsed, TimeWindow::AllTime);
    }
}
