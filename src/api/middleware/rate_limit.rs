//! Rate limiting middleware using token bucket algorithm.
//!
//! Both limiters are generic over the key extractor so the router can key
//! on the socket peer address or, behind a trusted proxy, on forwarded
//! headers.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor};

type Limiter<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates a rate limiter for the public sync trigger.
///
/// # Limits
///
/// - **Rate**: 1 request every 2 seconds
/// - **Burst**: 5 requests
///
/// Every request runs a full sync against the catalog, so the budget is
/// far below a normal page endpoint. Requests exceeding the limit receive
/// `429 Too Many Requests`.
pub fn layer<K: KeyExtractor>(key_extractor: K) -> Limiter<K> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a stricter rate limiter for authenticated endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
pub fn secure_layer<K: KeyExtractor>(key_extractor: K) -> Limiter<K> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(1)
            .burst_size(10)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}
