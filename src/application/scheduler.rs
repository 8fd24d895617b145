//! Scan Scheduler
//!
//! Unattended polling loop. Inside the active window each cycle checks the
//! held positions once and then walks the newest market pages, alerting on
//! every candidate. Outside the window it idles and re-checks.
//!
//! States:
//! - Sleeping: outside the active window, waiting `idle_sleep`
//! - Polling: running cycles back to back, paced by the inter-page delay
//!
//! Every wait is raced against the shutdown channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use tokio::sync::watch;

use crate::domain::AlertEvent;
use crate::ports::MarketDataPort;
use crate::strategy::{Candidate, CandidateFilter, DiversityVerdict};
use super::alert_dispatcher::AlertDispatcher;
use super::position_monitor::HeldPositionMonitor;

/// Local hours during which polling happens. `start == end` means all day;
/// `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 20,
        }
    }
}

impl ActiveWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self { start_hour, end_hour }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour == self.end_hour {
            true
        } else if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub page_size: u32,
    pub max_pages: u32,
    pub page_delay: Duration,
    pub idle_sleep: Duration,
    pub window: ActiveWindow,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 3,
            page_delay: Duration::from_secs(24),
            idle_sleep: Duration::from_secs(3600),
            window: ActiveWindow::default(),
        }
    }
}

/// Summary of one polling cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pages_fetched: u32,
    pub instruments_seen: usize,
    pub candidates: usize,
    /// Page whose fetch failed, ending the cycle early
    pub aborted_at_page: Option<u32>,
}

type HourSource = Arc<dyn Fn() -> u32 + Send + Sync>;

pub struct ScanScheduler {
    market: Arc<dyn MarketDataPort>,
    filter: CandidateFilter,
    monitor: HeldPositionMonitor,
    dispatcher: AlertDispatcher,
    settings: ScheduleSettings,
    hour_source: HourSource,
}

impl ScanScheduler {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        filter: CandidateFilter,
        monitor: HeldPositionMonitor,
        dispatcher: AlertDispatcher,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            market,
            filter,
            monitor,
            dispatcher,
            settings,
            hour_source: Arc::new(|| Local::now().hour()),
        }
    }

    /// Replace the local-clock hour lookup
    pub fn with_hour_source(mut self, source: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
        self.hour_source = Arc::new(source);
        self
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Poll until shutdown is signalled
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Scheduler started: window {}, {} pages of {}, {}s between pages",
            self.settings.window,
            self.settings.max_pages,
            self.settings.page_size,
            self.settings.page_delay.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let hour = (self.hour_source)();
            if !self.settings.window.contains(hour) {
                tracing::info!(
                    "Outside active window {} (hour {}), sleeping {}s",
                    self.settings.window,
                    hour,
                    self.settings.idle_sleep.as_secs()
                );
                if sleep_or_shutdown(self.settings.idle_sleep, &mut shutdown).await {
                    break;
                }
                continue;
            }

            tracing::info!("Reading market at {}", Local::now().to_rfc3339());
            let report = self.run_cycle(&mut shutdown).await;
            tracing::info!(
                "Cycle done: {} pages, {} instruments, {} candidates{}",
                report.pages_fetched,
                report.instruments_seen,
                report.candidates,
                report
                    .aborted_at_page
                    .map(|p| format!(", aborted at page {}", p))
                    .unwrap_or_default()
            );
        }

        tracing::info!("Scheduler stopped");
    }

    /// One polling cycle: held positions, then pages `1..=max_pages`
    pub async fn run_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();

        self.monitor.check_all(shutdown).await;

        for page in 1..=self.settings.max_pages {
            if *shutdown.borrow() {
                break;
            }

            match self.market.fetch_page(page, self.settings.page_size).await {
                Ok(instruments) => {
                    report.pages_fetched += 1;
                    report.instruments_seen += instruments.len();

                    let candidates = self.filter.filter(&instruments, Utc::now()).await;
                    if candidates.is_empty() {
                        tracing::info!("No good coins found on page {}", page);
                    }
                    for candidate in &candidates {
                        self.dispatcher.send(candidate_alert(candidate, Utc::now())).await;
                    }
                    report.candidates += candidates.len();
                }
                Err(e) => {
                    tracing::error!("Error reading market page {}: {}", page, e);
                    report.aborted_at_page = Some(page);
                }
            }

            if sleep_or_shutdown(self.settings.page_delay, shutdown).await {
                break;
            }
            if report.aborted_at_page.is_some() {
                break;
            }
        }

        report
    }
}

/// Sleep for `duration` unless shutdown arrives first. Returns true on shutdown.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return *shutdown.borrow(),
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}

/// Routine alert text for a scheduled-scan candidate
pub fn candidate_alert(candidate: &Candidate, now: DateTime<Utc>) -> AlertEvent {
    let instrument = &candidate.instrument;
    let holders = match candidate.diversity {
        DiversityVerdict::Diverse { total_holders, top_holder_pct } => format!(
            "{} with diverse investments (top holder {:.2}%)",
            total_holders, top_holder_pct
        ),
        DiversityVerdict::Unverified => "unverified".to_string(),
    };

    let message = format!(
        "{} ({})\nPrice: ${:.4}\nChange 24h: {:.2}%\nAge: {:.1} hours\nHolders: {}",
        instrument.symbol,
        instrument.name,
        instrument.current_price,
        instrument.change_24h,
        instrument.age_hours_at(now),
        holders
    );

    AlertEvent::routine(instrument.symbol.clone(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::domain::InstrumentSnapshot;
    use crate::ports::mocks::{MockMarketData, RecordingSink};
    use crate::strategy::FilterProfile;

    fn scheduler(market: Arc<MockMarketData>, sink: Arc<RecordingSink>) -> ScanScheduler {
        let dispatcher = AlertDispatcher::new(sink);
        let filter = CandidateFilter::new(market.clone(), FilterProfile::unattended());
        let monitor = HeldPositionMonitor::new(market.clone(), dispatcher.clone(), Vec::new());
        let settings = ScheduleSettings {
            page_delay: Duration::ZERO,
            window: ActiveWindow::new(0, 0),
            ..ScheduleSettings::default()
        };
        ScanScheduler::new(market, filter, monitor, dispatcher, settings)
    }

    #[test]
    fn test_default_window() {
        let window = ActiveWindow::default();
        assert!(!window.contains(7));
        assert!(window.contains(8));
        assert!(window.contains(19));
        assert!(!window.contains(20));
    }

    #[test]
    fn test_wrapping_window() {
        let window = ActiveWindow::new(20, 8);
        assert!(window.contains(23));
        assert!(window.contains(0));
        assert!(window.contains(7));
        assert!(!window.contains(8));
        assert!(!window.contains(12));
    }

    #[test]
    fn test_full_day_window() {
        let window = ActiveWindow::new(5, 5);
        assert!((0..24).all(|h| window.contains(h)));
    }

    #[tokio::test]
    async fn test_page_failure_aborts_remaining_pages() {
        let market = Arc::new(MockMarketData::new().with_page_failure(2, 1));
        let scheduler = scheduler(market.clone(), Arc::new(RecordingSink::new()));
        let (_tx, mut rx) = watch::channel(false);

        let report = scheduler.run_cycle(&mut rx).await;
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.aborted_at_page, Some(2));
        assert_eq!(market.page_calls(), vec![1, 2]);

        let report = scheduler.run_cycle(&mut rx).await;
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.aborted_at_page, None);
        assert_eq!(market.page_calls(), vec![1, 2, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_shutdown_before_cycle_fetches_nothing() {
        let market = Arc::new(MockMarketData::new());
        let scheduler = scheduler(market.clone(), Arc::new(RecordingSink::new()));
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        let report = scheduler.run_cycle(&mut rx).await;
        assert_eq!(report, CycleReport::default());
        assert!(market.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown_while_idle() {
        let market = Arc::new(MockMarketData::new());
        let sink = Arc::new(RecordingSink::new());
        let mut scheduler = scheduler(market.clone(), sink).with_hour_source(|| 3);
        scheduler.settings.window = ActiveWindow::default();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert!(market.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_sleep_or_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        assert!(!sleep_or_shutdown(Duration::from_millis(1), &mut rx).await);

        tx.send(true).unwrap();
        assert!(sleep_or_shutdown(Duration::from_secs(3600), &mut rx).await);
    }

    #[test]
    fn test_candidate_alert_text() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        let candidate = Candidate {
            instrument: InstrumentSnapshot {
                symbol: "MOON".to_string(),
                name: "Moon Coin".to_string(),
                current_price: 0.0123456,
                created_at: now - chrono::Duration::minutes(90),
                change_24h: 120.5,
                market_cap: None,
            },
            gain: 1.2,
            diversity: DiversityVerdict::Diverse {
                total_holders: 42,
                top_holder_pct: 12.5,
            },
        };

        let alert = candidate_alert(&candidate, now);
        assert_eq!(alert.symbol, "MOON");
        assert!(!alert.is_urgent());
        assert_eq!(
            alert.message,
            "MOON (Moon Coin)\nPrice: $0.0123\nChange 24h: 120.50%\nAge: 1.5 hours\n\
             Holders: 42 with diverse investments (top holder 12.50%)"
        );
    }
}
