//! Scheduled certificate checking.
//!
//! Wires the check service and a notification channel into a cron-driven
//! job: [`job::CheckCertJob`] wakes once a minute, runs every configured
//! check when the schedule is due and delivers one summary batch per
//! execution.

pub mod config;
pub mod job;
