//! Upstream data providers: Yahoo Finance index prices and NewsAPI headlines.

pub mod news;
pub mod rate_limit;
pub mod yahoo;

pub use news::{mock_news, NewsApiClient};
pub use rate_limit::RateLimiter;
pub use yahoo::YahooClient;
