//! Data store modules for Supabase integration

pub mod auth;
pub mod feedback;
pub mod portfolios;
pub mod profiles;
pub mod rankings;
pub mod supabase;

pub use auth::MfaService;
pub use feedback::FeedbackStore;
pub use portfolios::PortfolioStore;
pub use profiles::ProfileStore;
pub use rankings::RankingStore;
pub use supabase::SupabaseClient;
