//! Prometheus metrics for the gateway.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Gateway metrics with their own registry, exposed on `/metrics`.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Requests by method and response status.
    pub http_requests: IntCounterVec,
    /// Bytes copied to clients by proxied downloads, including partial copies.
    pub download_bytes: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
        )?;
        let download_bytes = IntCounter::new(
            "file_download_bytes_total",
            "Total bytes of file data sent to clients",
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(download_bytes.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            download_bytes,
        })
    }

    /// Text exposition format of all metrics.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.download_bytes.inc_by(42);
        metrics
            .http_requests
            .with_label_values(&["GET", "200"])
            .inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("file_download_bytes_total 42"));
        assert!(text.contains(r#"http_requests_total{method="GET",status="200"} 1"#));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.download_bytes.inc_by(5);
        assert_eq!(b.download_bytes.get(), 0);
    }
}
