//! Cost-aware rate limiting using GCRA (Generic Cell Rate Algorithm).
//!
//! Each registry operation has a token cost (health=1, available=2,
//! send=10). The per-IP budget per minute comes from
//! `registry.rate_limit_per_minute`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::middleware::Next;
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

const fn tokens(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(v) => v,
        None => NonZeroU32::MIN,
    }
}

pub fn operation_cost(method: &str, path: &str) -> NonZeroU32 {
    match (method, path) {
        (_, "/health") => tokens(1),
        ("GET", p) if p.starts_with("/available") => tokens(2),
        ("POST", "/register/") => tokens(5),
        ("DELETE", p) if p.starts_with("/unregister/") => tokens(5),
        ("POST", "/send/") => tokens(10),
        _ => tokens(5),
    }
}

pub type KeyedRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>;

/// `per_minute` tokens per client IP.
pub fn create_rate_limiter(per_minute: u32) -> Arc<KeyedRateLimiter> {
    Arc::new(RateLimiter::keyed(Quota::per_minute(tokens(per_minute))))
}

/// GCRA rate limiting middleware.
///
/// Extracts the client IP from `ConnectInfo`, computes the cost for the
/// requested operation, and checks the limiter. Returns 429 if the client
/// has exhausted its budget.
pub async fn gcra_rate_limit(
    axum::extract::State(limiter): axum::extract::State<Arc<KeyedRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let ip = request
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]));

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let cost = operation_cost(&method, &path);

    if !matches!(limiter.check_key_n(&ip, cost), Ok(Ok(()))) {
        tracing::warn!(ip = %ip, cost = cost.get(), path = %path, "rate limit exceeded");
        return Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header("content-type", "application/json")
            .header("retry-after", "60")
            .body(Body::from(
                serde_json::json!({"detail": "Rate limit exceeded"}).to_string(),
            ))
            .unwrap_or_default();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs() {
        assert_eq!(operation_cost("GET", "/health").get(), 1);
        assert_eq!(operation_cost("GET", "/available/").get(), 2);
        assert_eq!(operation_cost("GET", "/available").get(), 2);
        assert_eq!(operation_cost("POST", "/register/").get(), 5);
        assert_eq!(operation_cost("DELETE", "/unregister/alice").get(), 5);
        assert_eq!(operation_cost("POST", "/send/").get(), 10);
        assert_eq!(operation_cost("PUT", "/other").get(), 5);
    }

    #[test]
    fn test_budget_exhaustion() {
        let limiter = create_rate_limiter(10);
        let ip = IpAddr::from([10, 0, 0, 1]);
        assert!(matches!(limiter.check_key_n(&ip, tokens(10)), Ok(Ok(()))));
        assert!(!matches!(limiter.check_key_n(&ip, tokens(10)), Ok(Ok(()))));

        // Budgets are per IP.
        let other = IpAddr::from([10, 0, 0, 2]);
        assert!(matches!(limiter.check_key_n(&other, tokens(1)), Ok(Ok(()))));
    }

    #[test]
    fn test_zero_budget_falls_back_to_one() {
        let limiter = create_rate_limiter(0);
        let ip = IpAddr::from([10, 0, 0, 3]);
        assert!(matches!(limiter.check_key_n(&ip, tokens(1)), Ok(Ok(()))));
    }
}
