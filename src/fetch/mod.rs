//! Fetch core
//!
//! This module contains the request path shared by every portal adapter:
//! - A rate limiter capping concurrency and spacing admissions
//! - An HTTP fetcher with retry, backoff and error classification

mod client;
mod limiter;

pub use client::{
    build_http_client, FetchError, FetchRequest, FetchResponse, Fetcher, Method, RetryPolicy,
};
pub use limiter::{RateLimiter, RatePermit};
