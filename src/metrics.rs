/// File server hit counter shared by the `/app` middleware and the admin routes

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ApiMetrics {
    fileserver_hits: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.fileserver_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.fileserver_hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.fileserver_hits.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_and_resets() {
        let metrics = ApiMetrics::new();
        assert_eq!(metrics.hits(), 0);

        metrics.record_hit();
        metrics.record_hit();
        assert_eq!(metrics.hits(), 2);

        metrics.reset();
        assert_eq!(metrics.hits(), 0);
    }

    #[test]
    fn test_concurrent_hits() {
        let metrics = Arc::new(ApiMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_hit();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.hits(), 8000);
    }
}
