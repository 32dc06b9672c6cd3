//! Request middleware

pub mod rate_limit;

pub use rate_limit::{throttle_chatbot, RateLimitInfo, RateLimiter};
