//! HTTP layer: router, auth middleware and handlers

pub mod admin;
pub mod callback;
pub mod extract;
pub mod feedback;
pub mod middleware;
pub mod portfolios;
pub mod routes;
pub mod user;

pub use routes::build_router;
