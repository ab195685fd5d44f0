//! The cron-driven check job.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use cron::Schedule;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};

use certwatch_check::CertChecker;
use certwatch_common::types::{
    CertCheckNotification, CertCheckResult, CheckCertItem, NotificationLevel,
};
use certwatch_notify::Notifier;

/// Fallback expiration window when the configured value is unusable.
pub const DEFAULT_WARNING_DAYS: i64 = 30;

/// The job wakes at this cadence and fires when the current minute
/// matches the schedule.
const TICK_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid cron schedule '{schedule}': {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    #[error("a notifier is required to start the check job")]
    MissingNotifier,
}

/// Runs every configured certificate check on a cron schedule and hands
/// one summary batch per execution to the notifier.
///
/// Executions are serialized: a manual [`run_now`](Self::run_now) and a
/// scheduled firing never interleave. [`stop`](Self::stop) lets an
/// in-flight execution finish before the loop exits.
pub struct CheckCertJob {
    inner: Arc<JobInner>,
    stop: watch::Sender<bool>,
}

struct JobInner {
    schedule: Schedule,
    level: NotificationLevel,
    warning_days: i64,
    items: Vec<CheckCertItem>,
    checker: Arc<CertChecker>,
    notifier: Arc<dyn Notifier>,
    run_lock: Mutex<()>,
}

impl CheckCertJob {
    /// `warning_days <= 0` falls back to [`DEFAULT_WARNING_DAYS`]; an
    /// unrecognized `level` falls back to `Warning`. Deployments without a
    /// webhook pass a noop notifier rather than `None`.
    pub fn new(
        schedule: &str,
        level: &str,
        warning_days: i64,
        items: Vec<CheckCertItem>,
        checker: Arc<CertChecker>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, JobError> {
        let notifier = notifier.ok_or(JobError::MissingNotifier)?;
        let schedule = parse_schedule(schedule)?;
        let warning_days = if warning_days <= 0 {
            DEFAULT_WARNING_DAYS
        } else {
            warning_days
        };

        let (stop, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(JobInner {
                schedule,
                level: NotificationLevel::parse_or_default(level),
                warning_days,
                items,
                checker,
                notifier,
                run_lock: Mutex::new(()),
            }),
            stop,
        })
    }

    /// Spawns the scheduler loop.
    pub fn start(&self) {
        let inner = self.inner.clone();
        let mut stop_rx = self.stop.subscribe();

        tokio::spawn(async move {
            tracing::info!(
                certs = inner.items.len(),
                level = %inner.level,
                "Certificate check job started"
            );

            let mut tick = interval(Duration::from_secs(TICK_SECS));
            // Ticks missed while an execution overruns are dropped, so a
            // slow cycle never replays the same due minute afterwards.
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        if inner.is_due_at(Utc::now()) {
                            inner.execute().await;
                        }
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            tracing::info!("Certificate check job stopped");
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Signals the scheduler loop to exit.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Runs one execution immediately, outside the schedule.
    pub async fn run_now(&self) {
        self.inner.execute().await;
    }
}

impl JobInner {
    fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        // Compare at minute granularity so a firing minute matches no
        // matter where in the minute the tick lands.
        let minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        self.schedule.includes(minute)
    }

    async fn execute(&self) {
        let _guard = self.run_lock.lock().await;

        tracing::info!(certs = self.items.len(), "Running certificate checks");

        let mut batch = Vec::new();
        for item in &self.items {
            match self.checker.check_status(item, self.warning_days).await {
                Ok(result) => {
                    tracing::info!(
                        name = %result.hostname,
                        valid = result.is_valid,
                        days_left = result.validity_days,
                        "Certificate checked"
                    );
                    if should_notify(self.level, &result) {
                        batch.push(notification_for(&result));
                    }
                }
                Err(e) => {
                    tracing::error!(name = %item.name, error = %e, "Certificate check failed");
                }
            }
        }

        if let Err(e) = self.notifier.notify(&batch).await {
            tracing::error!(
                channel = self.notifier.channel_name(),
                error = %e,
                "Notification delivery failed"
            );
        } else {
            tracing::info!(
                channel = self.notifier.channel_name(),
                items = batch.len(),
                "Notification delivered"
            );
        }
    }
}

/// Accepts both standard five-field cron expressions and six-field ones
/// with a leading seconds column.
fn parse_schedule(schedule: &str) -> Result<Schedule, JobError> {
    let normalized = if schedule.split_whitespace().count() == 5 {
        format!("0 {schedule}")
    } else {
        schedule.to_string()
    };

    Schedule::from_str(&normalized).map_err(|e| JobError::InvalidSchedule {
        schedule: schedule.to_string(),
        reason: e.to_string(),
    })
}

/// Level filter: `Info` reports everything, `Warning` adds expiring
/// certificates to the invalid ones, `Error` reports invalid only.
fn should_notify(level: NotificationLevel, result: &CertCheckResult) -> bool {
    match level {
        NotificationLevel::Info => true,
        NotificationLevel::Warning => !result.is_valid || result.expiration_warning,
        NotificationLevel::Error => !result.is_valid,
    }
}

fn notification_for(result: &CertCheckResult) -> CertCheckNotification {
    let mut messages = result.validation_issues.clone();
    if result.is_valid && result.expiration_warning {
        messages.push(format!(
            "Certificate expires in {} days",
            result.validity_days
        ));
    }

    CertCheckNotification {
        hostname: result.hostname.clone(),
        is_valid: result.is_valid,
        expiration_warning: result.expiration_warning,
        messages,
    }
}
