//! Refresh scheduler: repeated fetch → normalize → aggregate cycles.
//!
//! The scheduler is a small state machine (`Idle`, `Fetching`, `Waiting`)
//! owned by one tokio task. Hosts talk to it through a [`RefreshHandle`]
//! and receive one [`CycleReport`] per completed cycle. At most one cycle is
//! in flight; triggers that arrive while fetching are dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::aggregate::aggregate;
use crate::error::{ErrorInfo, Result, WooxError};
use crate::history::OrderSource;
use crate::normalize::normalize;
use crate::signing::Credentials;
use crate::types::{OrderSet, PairFilter, PnlSeries, QueryWindow, TimeRange};

pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Clamp a refresh interval into the supported 5–300 s range.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshState {
    Idle,
    Fetching,
    Waiting(Duration),
}

/// Everything a cycle needs from the host. Replaced as a whole by
/// [`RefreshHandle::configure`] and read only when a cycle starts.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub credentials: Credentials,
    pub range: TimeRange,
    pub pair_filter: PairFilter,
    pub auto_refresh: bool,
    interval: Duration,
}

impl RefreshSettings {
    pub fn new(credentials: Credentials, range: TimeRange) -> Self {
        Self {
            credentials,
            range,
            pair_filter: PairFilter::All,
            auto_refresh: true,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_pair_filter(mut self, pair_filter: PairFilter) -> Self {
        self.pair_filter = pair_filter;
        self
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    /// Set the refresh interval, clamped to 5–300 s.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.set_interval(interval);
        self
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = clamp_interval(interval);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Output of one finished cycle, as handed to the display layer.
///
/// On failure `error` is set and the order/series fields are empty; there is
/// no partial result.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub finished_at: DateTime<Utc>,
    pub window: QueryWindow,
    pub pair_filter: PairFilter,
    pub orders: OrderSet,
    pub total_realized_pnl: Decimal,
    pub series: PnlSeries,
    pub error: Option<ErrorInfo>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run one fetch cycle: fetch all pages, normalize, aggregate.
///
/// # Errors
///
/// Returns `WooxError::Validation` for missing credentials, otherwise any
/// error from the source or from normalization.
pub async fn run_cycle<S: OrderSource>(
    source: &S,
    credentials: &Credentials,
    window: &QueryWindow,
    pair_filter: &PairFilter,
) -> Result<(OrderSet, PnlSeries)> {
    if credentials.is_empty() {
        return Err(WooxError::Validation(
            "both API key and API secret are required".into(),
        ));
    }
    let rows = source.fetch_all(credentials, window).await?;
    let orders = normalize(rows)?;
    let series = aggregate(&orders, pair_filter);
    Ok((orders, series))
}

#[derive(Debug)]
enum Command {
    Trigger,
    Configure(Box<RefreshSettings>),
}

/// Cloneable control handle for a running [`RefreshScheduler`].
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<RefreshState>,
}

impl RefreshHandle {
    /// Request an immediate cycle. Ignored while a cycle is in flight.
    ///
    /// Returns `false` if the scheduler has stopped.
    pub fn trigger(&self) -> bool {
        self.commands.send(Command::Trigger).is_ok()
    }

    /// Replace the settings used from the next cycle on.
    ///
    /// Returns `false` if the scheduler has stopped.
    pub fn configure(&self, settings: RefreshSettings) -> bool {
        self.commands
            .send(Command::Configure(Box::new(settings)))
            .is_ok()
    }

    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.state.clone()
    }
}

/// Owns the refresh state machine. Create with [`RefreshScheduler::new`],
/// then drive it with [`RefreshScheduler::run`] (usually in `tokio::spawn`).
pub struct RefreshScheduler<S> {
    source: S,
    settings: RefreshSettings,
    commands: mpsc::UnboundedReceiver<Command>,
    commands_open: bool,
    state_tx: watch::Sender<RefreshState>,
    reports: mpsc::UnboundedSender<CycleReport>,
    cycle: u64,
}

impl<S: OrderSource> RefreshScheduler<S> {
    pub fn new(
        source: S,
        settings: RefreshSettings,
    ) -> (Self, RefreshHandle, mpsc::UnboundedReceiver<CycleReport>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RefreshState::Idle);
        let (report_tx, report_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            source,
            settings,
            commands: cmd_rx,
            commands_open: true,
            state_tx,
            reports: report_tx,
            cycle: 0,
        };
        let handle = RefreshHandle {
            commands: cmd_tx,
            state: state_rx,
        };
        (scheduler, handle, report_rx)
    }

    /// Run until `cancel` fires, or until every handle is dropped while idle.
    ///
    /// With auto-refresh enabled the first cycle starts immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut state = if self.settings.auto_refresh {
            RefreshState::Fetching
        } else {
            RefreshState::Idle
        };

        loop {
            self.state_tx.send_replace(state);
            let next = match state {
                RefreshState::Idle => self.idle(&cancel).await,
                RefreshState::Fetching => self.fetch(&cancel).await,
                RefreshState::Waiting(delay) => self.wait(delay, &cancel).await,
            };
            match next {
                Some(s) => state = s,
                None => break,
            }
        }

        debug!(cycles = self.cycle, "refresh scheduler stopped");
    }

    async fn idle(&mut self, cancel: &CancellationToken) -> Option<RefreshState> {
        if !self.commands_open {
            return None;
        }
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                cmd = self.commands.recv(), if self.commands_open => match cmd {
                    Some(Command::Trigger) => return Some(RefreshState::Fetching),
                    Some(Command::Configure(settings)) => self.apply(*settings),
                    // Nothing can trigger a cycle any more.
                    None => return None,
                },
            }
        }
    }

    async fn wait(&mut self, delay: Duration, cancel: &CancellationToken) -> Option<RefreshState> {
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut sleep => return Some(RefreshState::Fetching),
                cmd = self.commands.recv(), if self.commands_open => match cmd {
                    Some(Command::Trigger) => {
                        debug!("manual trigger, skipping remaining wait");
                        return Some(RefreshState::Fetching);
                    }
                    Some(Command::Configure(settings)) => {
                        self.apply(*settings);
                        if !self.settings.auto_refresh {
                            return Some(RefreshState::Idle);
                        }
                    }
                    None => {
                        self.commands_open = false;
                    }
                },
            }
        }
    }

    async fn fetch(&mut self, cancel: &CancellationToken) -> Option<RefreshState> {
        self.cycle += 1;
        let cycle = self.cycle;

        // Snapshot the inputs; settings changes wait for the next cycle.
        let window = self
            .settings
            .range
            .resolve(Utc::now())
            .with_pair(&self.settings.pair_filter);
        let credentials = self.settings.credentials.clone();
        let pair_filter = self.settings.pair_filter.clone();

        info!(
            cycle,
            start_ms = window.start_ms,
            end_ms = window.end_ms,
            pair = %pair_filter,
            "fetch cycle starting"
        );

        let mut pending: Option<RefreshSettings> = None;
        let mut coalesced = 0u32;

        let outcome = {
            let work = run_cycle(&self.source, &credentials, &window, &pair_filter);
            tokio::pin!(work);
            loop {
                tokio::select! {
                    res = &mut work => break Some(res),
                    _ = cancel.cancelled() => break None,
                    cmd = self.commands.recv(), if self.commands_open => match cmd {
                        Some(Command::Trigger) => coalesced += 1,
                        Some(Command::Configure(settings)) => pending = Some(*settings),
                        None => self.commands_open = false,
                    },
                }
            }
        };

        let Some(outcome) = outcome else {
            info!(cycle, "fetch cycle abandoned on shutdown");
            return None;
        };

        // Anything queued while fetching counts as arriving during the fetch.
        while let Ok(cmd) = self.commands.try_recv() {
            match cmd {
                Command::Trigger => coalesced += 1,
                Command::Configure(settings) => pending = Some(*settings),
            }
        }
        if coalesced > 0 {
            debug!(cycle, coalesced, "ignored triggers received during fetch");
        }
        if let Some(settings) = pending {
            self.apply(settings);
        }

        let report = match outcome {
            Ok((orders, series)) => {
                info!(
                    cycle,
                    orders = orders.len(),
                    points = series.len(),
                    total_pnl = %series.total_realized_pnl,
                    "fetch cycle complete"
                );
                CycleReport {
                    cycle,
                    finished_at: Utc::now(),
                    window,
                    pair_filter,
                    orders,
                    total_realized_pnl: series.total_realized_pnl,
                    series,
                    error: None,
                }
            }
            Err(e) => {
                error!(cycle, kind = ?e.kind(), error = %e, "fetch cycle failed");
                CycleReport {
                    cycle,
                    finished_at: Utc::now(),
                    window,
                    pair_filter,
                    orders: OrderSet::default(),
                    total_realized_pnl: Decimal::ZERO,
                    series: PnlSeries::default(),
                    error: Some(ErrorInfo::from(&e)),
                }
            }
        };

        let succeeded = report.is_ok();
        if self.reports.send(report).is_err() {
            debug!(cycle, "report receiver dropped");
        }

        if succeeded && self.settings.auto_refresh {
            Some(RefreshState::Waiting(self.settings.interval()))
        } else {
            Some(RefreshState::Idle)
        }
    }

    fn apply(&mut self, settings: RefreshSettings) {
        debug!(
            auto_refresh = settings.auto_refresh,
            interval_secs = settings.interval().as_secs(),
            pair = %settings.pair_filter,
            "refresh settings updated"
        );
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(Duration::from_secs(1)), MIN_REFRESH_INTERVAL);
        assert_eq!(clamp_interval(Duration::from_secs(30)), Duration::from_secs(30));
        assert_eq!(clamp_interval(Duration::from_secs(3600)), MAX_REFRESH_INTERVAL);
    }

    #[test]
    fn test_settings_interval_is_clamped() {
        let creds = Credentials::new("k", "s");
        let range = TimeRange::Quick(crate::types::QuickRange::Today);
        let s = RefreshSettings::new(creds, range).with_interval(Duration::from_millis(10));
        assert_eq!(s.interval(), MIN_REFRESH_INTERVAL);
        assert!(s.auto_refresh);
        assert_eq!(s.pair_filter, PairFilter::All);
    }
}
