//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a limiter that lets one call through per `period`.
/// A zero period disables limiting.
pub fn create_cooldown_limiter(period: Duration) -> Arc<Limiter> {
    let quota = Quota::with_period(period)
        .map(|q| q.allow_burst(NonZeroU32::MIN))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
    Arc::new(RateLimiter::direct(quota))
}
