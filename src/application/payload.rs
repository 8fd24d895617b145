//! Ranking payload assembly
//!
//! Gathers candles and holder stats for each candidate. A lookup that fails
//! leaves its fields empty; the candidate itself is always kept.

use std::collections::BTreeMap;

use crate::domain::HolderAnalysis;
use crate::ports::{CandidatePayload, MarketDataPort};
use crate::strategy::Candidate;

pub async fn build_payload(
    market: &dyn MarketDataPort,
    candidates: &[Candidate],
    timeframe: &str,
    holder_limit: u32,
) -> Vec<CandidatePayload> {
    let mut payload = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let instrument = &candidate.instrument;

        let price_history = match market.fetch_candles(&instrument.symbol, timeframe).await {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!("Payload: candles for {} unavailable: {}", instrument.symbol, e);
                Vec::new()
            }
        };

        let analysis = match market.fetch_holders(&instrument.symbol, holder_limit).await {
            Ok(snapshot) => Some(HolderAnalysis::of(&snapshot)),
            Err(e) => {
                tracing::warn!("Payload: holders for {} unavailable: {}", instrument.symbol, e);
                None
            }
        };

        let (total_holders, top_holder_percentage, holders_quantity_distribution) = match analysis {
            Some(a) => {
                let top = (a.listed_holders > 0).then_some(a.top_holder_percentage);
                (Some(a.total_holders), top, a.quantity_distribution)
            }
            None => (None, None, BTreeMap::new()),
        };

        payload.push(CandidatePayload {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            current_price: instrument.current_price,
            market_cap: instrument.market_cap,
            price_history,
            total_holders,
            top_holder_percentage,
            holders_quantity_distribution,
        });
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::domain::{CandlestickSample, HolderEntry, HolderSnapshot, InstrumentSnapshot};
    use crate::ports::mocks::MockMarketData;
    use crate::strategy::DiversityVerdict;

    fn candidate(symbol: &str) -> Candidate {
        Candidate {
            instrument: InstrumentSnapshot {
                symbol: symbol.to_string(),
                name: format!("{} coin", symbol),
                current_price: 0.01,
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                change_24h: 12.0,
                market_cap: Some(5000.0),
            },
            gain: 0.8,
            diversity: DiversityVerdict::Unverified,
        }
    }

    #[tokio::test]
    async fn test_payload_with_full_data() {
        let candle = CandlestickSample {
            open: 1.0,
            close: 2.0,
            low: 1.0,
            high: 2.1,
            time: Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap(),
        };
        let holders = HolderSnapshot::new(
            12,
            vec![
                HolderEntry { address: "a".into(), quantity: 100.0, percentage: 40.0 },
                HolderEntry { address: "b".into(), quantity: 50.0, percentage: 20.0 },
                HolderEntry { address: "c".into(), quantity: 50.0, percentage: 20.0 },
            ],
        );
        let market = MockMarketData::new()
            .with_candles("AAA", vec![candle])
            .with_holders("AAA", holders);

        let payload = build_payload(&market, &[candidate("AAA")], "1h", 50).await;

        assert_eq!(payload.len(), 1);
        let entry = &payload[0];
        assert_eq!(entry.price_history, vec![candle]);
        assert_eq!(entry.total_holders, Some(12));
        assert_eq!(entry.top_holder_percentage, Some(40.0));
        assert_eq!(entry.holders_quantity_distribution.get("50"), Some(&2));
        assert_eq!(entry.market_cap, Some(5000.0));
    }

    #[tokio::test]
    async fn test_failed_lookups_keep_candidate() {
        let market = MockMarketData::new().with_candle_error("BBB");

        let payload = build_payload(&market, &[candidate("BBB")], "1h", 50).await;

        assert_eq!(payload.len(), 1);
        assert!(payload[0].price_history.is_empty());
        assert_eq!(payload[0].total_holders, None);
        assert_eq!(payload[0].top_holder_percentage, None);
        assert!(payload[0].holders_quantity_distribution.is_empty());
    }
}
