//! On-demand Scan Service
//!
//! Runs one interactive scan: fetch the newest page, filter it, build the
//! ranking payload and ask the ranking service to order the survivors.
//! Scans run on their own task so the command surface stays responsive.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::ports::{MarketDataError, MarketDataPort, RankedCoin, RankingError, RankingOutcome, RankingPort};
use crate::strategy::candidate_filter::{DEFAULT_HOLDER_LIMIT, DEFAULT_TIMEFRAME};
use crate::strategy::{CandidateFilter, FilterProfile, ProfileError};
use super::payload::build_payload;

pub const MAX_NUM_SCANS: u32 = 100;

/// Lines shown in a ranked summary, excluding the header
const SUMMARY_LINES: usize = 9;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Market read failed: {0}")]
    Market(#[from] MarketDataError),

    #[error("No response from ranking service: {0}")]
    Ranking(#[from] RankingError),

    #[error("Invalid scan parameters: {0}")]
    InvalidParams(#[from] ProfileError),
}

/// User-tunable scan parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    pub min_price: f64,
    /// Fractional gain, 0.5 = +50%
    pub min_gain: f64,
    /// Page size of the single page fetched
    pub num_scans: u32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_price: 0.0001,
            min_gain: 0.5,
            num_scans: MAX_NUM_SCANS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    NoCandidates,
    Ranked(Vec<RankedCoin>),
    /// Ranking content that was not in the expected shape
    Unexpected(String),
}

pub struct ScanService {
    market: Arc<dyn MarketDataPort>,
    ranker: Arc<dyn RankingPort>,
    profile: FilterProfile,
    timeframe: String,
    holder_limit: u32,
}

impl ScanService {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        ranker: Arc<dyn RankingPort>,
        profile: FilterProfile,
    ) -> Self {
        Self {
            market,
            ranker,
            profile,
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            holder_limit: DEFAULT_HOLDER_LIMIT,
        }
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = timeframe.into();
        self
    }

    pub fn with_holder_limit(mut self, limit: u32) -> Self {
        self.holder_limit = limit;
        self
    }

    pub async fn run(&self, params: ScanParams) -> Result<ScanOutcome, ScanError> {
        let profile = self
            .profile
            .clone()
            .with_min_price(params.min_price)
            .with_min_gain(params.min_gain);
        profile.validate()?;

        tracing::info!(
            "Scan started: minprice={}, mingain={}, numscans={}",
            params.min_price,
            params.min_gain,
            params.num_scans
        );

        let instruments = self.market.fetch_page(1, params.num_scans).await?;
        tracing::info!("Fetched {} coins from market", instruments.len());

        let filter = CandidateFilter::new(self.market.clone(), profile)
            .with_timeframe(self.timeframe.clone())
            .with_holder_limit(self.holder_limit);
        let candidates = filter.filter(&instruments, Utc::now()).await;

        if candidates.is_empty() {
            return Ok(ScanOutcome::NoCandidates);
        }

        let payload = build_payload(
            self.market.as_ref(),
            &candidates,
            &self.timeframe,
            self.holder_limit,
        )
        .await;

        match self.ranker.rank(&payload).await? {
            RankingOutcome::Ranked(coins) => Ok(ScanOutcome::Ranked(coins)),
            RankingOutcome::Raw(raw) => Ok(ScanOutcome::Unexpected(raw)),
        }
    }
}

pub fn acknowledgement(params: &ScanParams) -> String {
    format!(
        "Scanning Rugplay with minprice={}, mingain={}, numscans={}, please stand by",
        params.min_price, params.min_gain, params.num_scans
    )
}

/// Text reply for a finished scan
pub fn render_reply(result: &Result<ScanOutcome, ScanError>) -> String {
    match result {
        Ok(ScanOutcome::NoCandidates) => "No coins met the criteria.".to_string(),
        Ok(ScanOutcome::Ranked(coins)) => render_summary(coins),
        Ok(ScanOutcome::Unexpected(raw)) => {
            format!("Unexpected AI response format. Raw response:\n{}", raw)
        }
        Err(e) => e.to_string(),
    }
}

pub fn render_summary(coins: &[RankedCoin]) -> String {
    let mut lines = vec!["AI-Ranked Coins:".to_string()];

    for (i, coin) in coins.iter().take(SUMMARY_LINES).enumerate() {
        let mut fields = vec![format!(
            "`{}` - {}",
            or_na(&coin.symbol),
            or_na(&coin.name)
        )];

        if !coin.investment_potential.is_null() {
            fields.push(format!(
                "investmentPotential: {}",
                render_value(&coin.investment_potential)
            ));
        }
        for (key, value) in &coin.extra {
            fields.push(format!("{}: {}", key, render_value(value)));
        }

        lines.push(format!("{}. {}", i + 1, fields.join(" | ")));
    }

    lines.join("\n")
}

fn or_na(s: &str) -> &str {
    if s.is_empty() {
        "N/A"
    } else {
        s
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64().map(format_sig6).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Six significant digits, trailing zeros dropped, scientific notation for
/// very large or very small magnitudes
pub fn format_sig6(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let sci = format!("{:.5e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs());
    }

    let decimals = (5 - exp).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, v)).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::collections::BTreeMap;
    use crate::domain::{CandlestickSample, HolderEntry, HolderSnapshot, InstrumentSnapshot};
    use crate::ports::mocks::{MarketCall, MockMarketData, MockRanker};

    fn coin(symbol: &str, age_hours: i64, price: f64) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.to_string(),
            name: format!("{} coin", symbol),
            current_price: price,
            created_at: Utc::now() - Duration::hours(age_hours),
            change_24h: 0.0,
            market_cap: None,
        }
    }

    fn rising() -> Vec<CandlestickSample> {
        let t = Utc::now();
        vec![
            CandlestickSample { open: 1.0, close: 1.4, low: 1.0, high: 1.5, time: t },
            CandlestickSample { open: 1.4, close: 2.0, low: 1.3, high: 2.1, time: t },
        ]
    }

    fn diverse() -> HolderSnapshot {
        let holders = (0..6)
            .map(|i| HolderEntry {
                address: format!("h{}", i),
                quantity: 10.0 + i as f64,
                percentage: 20.0 - i as f64,
            })
            .collect();
        HolderSnapshot::new(30, holders)
    }

    fn ranked(symbol: &str, potential: Value) -> RankedCoin {
        RankedCoin {
            symbol: symbol.to_string(),
            name: format!("{} coin", symbol),
            investment_potential: potential,
            extra: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_scan_ranks_survivors() {
        let market = Arc::new(
            MockMarketData::new()
                .with_page(1, vec![coin("OLD", 400, 1.0), coin("NEW", 3, 1.0)])
                .with_candles("NEW", rising())
                .with_holders("NEW", diverse()),
        );
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Ranked(vec![ranked("NEW", json!(9.1))])));
        let service = ScanService::new(market.clone(), ranker.clone(), FilterProfile::interactive());

        let outcome = service.run(ScanParams::default()).await.unwrap();

        assert_eq!(outcome, ScanOutcome::Ranked(vec![ranked("NEW", json!(9.1))]));
        let requests = ranker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 1);
        assert_eq!(requests[0][0].symbol, "NEW");
        assert!(market.calls_for("OLD").is_empty());
    }

    #[tokio::test]
    async fn test_scan_with_no_survivors_skips_ranking() {
        let market = Arc::new(MockMarketData::new().with_page(1, vec![coin("CHEAP", 3, 0.00001)]));
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Raw("unused".into())));
        let service = ScanService::new(market, ranker.clone(), FilterProfile::interactive());

        let outcome = service.run(ScanParams::default()).await.unwrap();

        assert_eq!(outcome, ScanOutcome::NoCandidates);
        assert!(ranker.requests().is_empty());
    }

    #[tokio::test]
    async fn test_scan_params_override_profile() {
        let market = Arc::new(
            MockMarketData::new()
                .with_page(1, vec![coin("NEW", 3, 1.0)])
                .with_candles("NEW", rising())
                .with_holders("NEW", diverse()),
        );
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Raw("x".into())));
        let service = ScanService::new(market.clone(), ranker, FilterProfile::interactive());

        let params = ScanParams { min_gain: 2.0, ..ScanParams::default() };
        assert_eq!(service.run(params).await.unwrap(), ScanOutcome::NoCandidates);
        assert!(!market.get_calls().contains(&MarketCall::Holders("NEW".into())));
    }

    #[tokio::test]
    async fn test_unexpected_ranking_shape_surfaces_raw() {
        let market = Arc::new(
            MockMarketData::new()
                .with_page(1, vec![coin("NEW", 3, 1.0)])
                .with_candles("NEW", rising())
                .with_holders("NEW", diverse()),
        );
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Raw("I like NEW".into())));
        let service = ScanService::new(market, ranker, FilterProfile::interactive());

        let result = service.run(ScanParams::default()).await;
        assert_eq!(
            render_reply(&result),
            "Unexpected AI response format. Raw response:\nI like NEW"
        );
    }

    #[tokio::test]
    async fn test_page_failure_is_reported() {
        let market = Arc::new(MockMarketData::new().with_page_failure(1, 1));
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Raw("x".into())));
        let service = ScanService::new(market, ranker, FilterProfile::interactive());

        let result = service.run(ScanParams::default()).await;
        assert!(matches!(result, Err(ScanError::Market(_))));
        assert!(render_reply(&result).starts_with("Market read failed"));
    }

    #[tokio::test]
    async fn test_invalid_min_price_rejected_before_fetch() {
        let market = Arc::new(MockMarketData::new());
        let ranker = Arc::new(MockRanker::new(RankingOutcome::Raw("x".into())));
        let service = ScanService::new(market.clone(), ranker, FilterProfile::interactive());

        let params = ScanParams { min_price: -1.0, ..ScanParams::default() };
        assert!(matches!(service.run(params).await, Err(ScanError::InvalidParams(_))));
        assert!(market.get_calls().is_empty());
    }

    #[test]
    fn test_summary_limited_to_nine_lines() {
        let coins: Vec<RankedCoin> = (0..12).map(|i| ranked(&format!("C{}", i), json!(i))).collect();
        let summary = render_summary(&coins);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "AI-Ranked Coins:");
        assert_eq!(lines[1], "1. `C0` - C0 coin | investmentPotential: 0");
        assert!(lines[9].starts_with("9. `C8`"));
    }

    #[test]
    fn test_summary_extra_fields_and_missing_names() {
        let mut coin = ranked("", json!(7.123456789));
        coin.name = String::new();
        coin.extra.insert("risk".to_string(), json!("high"));

        assert_eq!(
            render_summary(&[coin]),
            "AI-Ranked Coins:\n1. `N/A` - N/A | investmentPotential: 7.12346 | risk: high"
        );
    }

    #[test]
    fn test_format_sig6() {
        assert_eq!(format_sig6(8.5), "8.5");
        assert_eq!(format_sig6(7.0), "7");
        assert_eq!(format_sig6(0.000123456789), "0.000123457");
        assert_eq!(format_sig6(1234567.0), "1.23457e+06");
        assert_eq!(format_sig6(0.00001234), "1.234e-05");
        assert_eq!(format_sig6(-42.125), "-42.125");
        assert_eq!(format_sig6(0.0), "0");
    }

    #[test]
    fn test_acknowledgement() {
        assert_eq!(
            acknowledgement(&ScanParams::default()),
            "Scanning Rugplay with minprice=0.0001, mingain=0.5, numscans=100, please stand by"
        );
    }
}
