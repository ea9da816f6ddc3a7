//! Application state shared across routes

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::store::{
    FeedbackStore, MfaService, PortfolioStore, ProfileStore, RankingStore, SupabaseClient,
};
use crate::util::rate_limit::{create_cooldown_limiter, Limiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub supabase: SupabaseClient,
    pub profile_store: ProfileStore,
    pub portfolio_store: PortfolioStore,
    pub ranking_store: RankingStore,
    pub feedback_store: FeedbackStore,
    pub mfa: MfaService,
    /// Process-wide throttle on manual ranking refreshes
    pub refresh_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let supabase = SupabaseClient::new(&config);

        let profile_store = ProfileStore::new(supabase.clone());
        let portfolio_store = PortfolioStore::new(supabase.clone());
        let ranking_store = RankingStore::new(supabase.clone());
        let feedback_store = FeedbackStore::new(supabase.clone());
        let mfa = MfaService::new(supabase.clone());

        let refresh_limiter = create_cooldown_limiter(Duration::from_secs(
            config.rankings_refresh_cooldown_secs,
        ));

        Self {
            config,
            supabase,
            profile_store,
            portfolio_store,
            ranking_store,
            feedback_store,
            mfa,
            refresh_limiter,
        }
    }
}
