//! Held Position Monitor
//!
//! Watches the holder structure of instruments the operator already holds.
//! A wide gap between the two largest holders means the dominant holder is
//! still in; once the gap closes to the threshold or below, the dominant
//! holder has probably sold and an urgent alert goes out.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{AlertEvent, HolderAnalysis};
use crate::ports::MarketDataPort;
use crate::strategy::candidate_filter::DEFAULT_HOLDER_LIMIT;
use super::alert_dispatcher::AlertDispatcher;

/// Gap (percentage points) above which the position is considered healthy
pub const DEFAULT_GAP_THRESHOLD: f64 = 50.0;

/// Outcome of checking one watched symbol
#[derive(Debug, Clone, PartialEq)]
pub enum PositionCheck {
    Healthy { gap: f64 },
    Alerted { gap: f64 },
    /// Fewer than two holders listed
    TooFewHolders,
    FetchFailed,
}

pub struct HeldPositionMonitor {
    market: Arc<dyn MarketDataPort>,
    dispatcher: AlertDispatcher,
    symbols: Vec<String>,
    gap_threshold: f64,
    holder_limit: u32,
}

impl HeldPositionMonitor {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        dispatcher: AlertDispatcher,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            market,
            dispatcher,
            symbols,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            holder_limit: DEFAULT_HOLDER_LIMIT,
        }
    }

    pub fn with_holder_limit(mut self, limit: u32) -> Self {
        self.holder_limit = limit;
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Check every watched symbol once. Stops early if shutdown is signalled.
    pub async fn check_all(&self, shutdown: &watch::Receiver<bool>) -> Vec<(String, PositionCheck)> {
        let mut results = Vec::with_capacity(self.symbols.len());

        for symbol in &self.symbols {
            if *shutdown.borrow() {
                tracing::info!("Shutdown requested, stopping held-position checks");
                break;
            }
            let check = self.check(symbol).await;
            results.push((symbol.clone(), check));
        }

        results
    }

    pub async fn check(&self, symbol: &str) -> PositionCheck {
        let snapshot = match self.market.fetch_holders(symbol, self.holder_limit).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Held position {}: holder lookup failed: {}", symbol, e);
                return PositionCheck::FetchFailed;
            }
        };

        let analysis = HolderAnalysis::of(&snapshot);
        let (top, second) = match analysis.second_holder_percentage {
            Some(second) => (analysis.top_holder_percentage, second),
            None => {
                tracing::debug!("Held position {}: fewer than 2 holders, skipping", symbol);
                return PositionCheck::TooFewHolders;
            }
        };

        let gap = top - second;
        if gap > self.gap_threshold {
            tracing::debug!("Held position {} healthy (gap {:.2})", symbol, gap);
            return PositionCheck::Healthy { gap };
        }

        tracing::warn!("Held position {}: top-holder gap closed to {:.2}", symbol, gap);
        let message = format!(
            "{}: top holder at {:.2}% vs second at {:.2}% (gap {:.2}). Main holder may have sold.",
            symbol, top, second, gap
        );
        self.dispatcher.send(AlertEvent::urgent(symbol, message)).await;

        PositionCheck::Alerted { gap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HolderEntry, HolderSnapshot, Severity};
    use crate::ports::mocks::{MockMarketData, RecordingSink};
    use approx::assert_relative_eq;

    fn snapshot(pcts: &[f64]) -> HolderSnapshot {
        let holders = pcts
            .iter()
            .enumerate()
            .map(|(i, p)| HolderEntry {
                address: format!("h{}", i),
                quantity: *p * 10.0,
                percentage: *p,
            })
            .collect();
        HolderSnapshot::new(pcts.len() as u64, holders)
    }

    fn monitor(market: MockMarketData, sink: Arc<RecordingSink>, symbols: &[&str]) -> HeldPositionMonitor {
        HeldPositionMonitor::new(
            Arc::new(market),
            AlertDispatcher::new(sink),
            symbols.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_wide_gap_is_healthy() {
        let sink = Arc::new(RecordingSink::new());
        let market = MockMarketData::new().with_holders("HELD", snapshot(&[80.0, 10.0, 10.0]));
        let monitor = monitor(market, sink.clone(), &["HELD"]);

        match monitor.check("HELD").await {
            PositionCheck::Healthy { gap } => assert_relative_eq!(gap, 70.0),
            other => panic!("expected healthy, got {:?}", other),
        }
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_closed_gap_sends_urgent_alert() {
        let sink = Arc::new(RecordingSink::new());
        let market = MockMarketData::new().with_holders("HELD", snapshot(&[55.0, 45.0]));
        let monitor = monitor(market, sink.clone(), &["HELD"]);

        assert!(matches!(monitor.check("HELD").await, PositionCheck::Alerted { .. }));

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].severity, Severity::Urgent);
        assert!(delivered[0].message.contains("55.00%"));
    }

    #[tokio::test]
    async fn test_gap_exactly_at_threshold_alerts() {
        let sink = Arc::new(RecordingSink::new());
        let market = MockMarketData::new().with_holders("HELD", snapshot(&[70.0, 20.0]));
        let monitor = monitor(market, sink.clone(), &["HELD"]);

        assert!(matches!(monitor.check("HELD").await, PositionCheck::Alerted { .. }));
        assert_eq!(sink.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_single_holder_skipped() {
        let sink = Arc::new(RecordingSink::new());
        let market = MockMarketData::new().with_holders("HELD", snapshot(&[100.0]));
        let monitor = monitor(market, sink.clone(), &["HELD"]);

        assert_eq!(monitor.check("HELD").await, PositionCheck::TooFewHolders);
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_stop_the_list() {
        let sink = Arc::new(RecordingSink::new());
        let market = MockMarketData::new().with_holders("SECOND", snapshot(&[40.0, 35.0]));
        let monitor = monitor(market, sink.clone(), &["FIRST", "SECOND"]);
        let (_tx, rx) = watch::channel(false);

        let results = monitor.check_all(&rx).await;
        assert_eq!(results[0].1, PositionCheck::FetchFailed);
        assert!(matches!(results[1].1, PositionCheck::Alerted { .. }));
        assert_eq!(sink.delivered_symbols(), vec!["SECOND".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_symbols() {
        let sink = Arc::new(RecordingSink::new());
        let market = Arc::new(MockMarketData::new());
        let monitor = HeldPositionMonitor::new(
            market.clone(),
            AlertDispatcher::new(sink),
            vec!["A".to_string(), "B".to_string()],
        );
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(monitor.check_all(&rx).await.is_empty());
        assert!(market.get_calls().is_empty());
    }
}
