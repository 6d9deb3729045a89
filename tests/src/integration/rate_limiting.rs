//! # Admission Control Tests
//!
//! The budget lives in the shared cache store, so every worker fronting the
//! same store enforces one combined budget per client identity.

#[cfg(test)]
mod tests {
    use crate::support::runtime;
    use shared_cache::{
        CacheStore, FixedWindowLimiter, InMemoryCacheStore, RateLimitError, RateLimitRejection,
    };
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_budget_is_shared_across_workers() {
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        // Two worker processes fronting the same counter store.
        let worker_a = FixedWindowLimiter::new(Arc::clone(&store), "global", 10, Duration::from_secs(60));
        let worker_b = FixedWindowLimiter::new(Arc::clone(&store), "global", 10, Duration::from_secs(60));

        for i in 0..10 {
            let worker = if i % 2 == 0 { &worker_a } else { &worker_b };
            assert!(worker.consume("203.0.113.7").await.is_ok());
        }

        // The 11th request is rejected no matter which worker receives it.
        assert!(matches!(
            worker_a.consume("203.0.113.7").await,
            Err(RateLimitError::Exceeded { .. })
        ));
        assert!(matches!(
            worker_b.consume("203.0.113.7").await,
            Err(RateLimitError::Exceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_scopes_keep_independent_budgets() {
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let global = FixedWindowLimiter::new(Arc::clone(&store), "global", 1, Duration::from_secs(60));
        let sensitive =
            FixedWindowLimiter::new(Arc::clone(&store), "sensitive", 1, Duration::from_secs(60));

        assert!(global.consume("u1").await.is_ok());
        assert!(global.consume("u1").await.is_err());

        // Exhausting the global scope leaves the sensitive scope untouched.
        assert!(sensitive.consume("u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_runtime_ships_the_documented_budgets() {
        let rt = runtime().await;

        assert_eq!(rt.global_limiter.budget(), 10);
        assert_eq!(rt.global_limiter.window(), Duration::from_secs(1));
        assert_eq!(rt.sensitive_limiter.budget(), 50);
        assert_eq!(rt.sensitive_limiter.window(), Duration::from_secs(15 * 60));
        rt.shutdown();
    }

    #[test]
    fn test_rejection_body_is_the_boundary_contract() {
        let body = serde_json::to_string(&RateLimitRejection::too_many_requests()).unwrap();
        assert_eq!(body, r#"{"success":false,"message":"Too many requests"}"#);
    }
}
