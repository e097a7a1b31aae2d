//! # Order Metrics
//!
//! One counter vector, `orders_processed_total{status, env}`, held in a registry owned by
//! this process rather than the global default. The poll loop sees it only as an
//! [`OutcomeRecorder`]; the `/metrics` endpoint renders it.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use queue_framework::{Outcome, OutcomeRecorder};

pub const ORDERS_PROCESSED: &str = "orders_processed_total";

#[derive(Clone)]
pub struct OrderMetrics {
    registry: Registry,
    orders_processed: IntCounterVec,
    environment: String,
}

impl OrderMetrics {
    /// Registers the counter and creates the `success` and `error` series for `environment`
    /// at zero.
    pub fn new(environment: impl Into<String>) -> Result<Self, prometheus::Error> {
        let environment = environment.into();
        let registry = Registry::new();
        let orders_processed = IntCounterVec::new(
            Opts::new(ORDERS_PROCESSED, "Total number of orders processed"),
            &["status", "env"],
        )?;
        registry.register(Box::new(orders_processed.clone()))?;

        for outcome in Outcome::ALL {
            orders_processed.with_label_values(&[outcome.as_str(), environment.as_str()]);
        }

        Ok(Self {
            registry,
            orders_processed,
            environment,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Current value of one series.
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.orders_processed
            .with_label_values(&[outcome.as_str(), self.environment.as_str()])
            .get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl OutcomeRecorder for OrderMetrics {
    fn record(&self, outcome: Outcome) {
        self.orders_processed
            .with_label_values(&[outcome.as_str(), self.environment.as_str()])
            .inc();
    }
}

impl std::fmt::Debug for OrderMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderMetrics")
            .field("environment", &self.environment)
            .field("success", &self.count(Outcome::Success))
            .field("error", &self.count(Outcome::Error))
            .finish()
    }
}
