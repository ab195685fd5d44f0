//! Shared data model for the certwatch workspace.
//!
//! Configured check targets, check results and the notification projection
//! passed between the check service, the scheduler and the notifiers.

pub mod types;
