/// Errors that can occur within the notification subsystem.
///
/// # Examples
///
/// ```rust
/// use certwatch_notify::error::NotifyError;
///
/// let err = NotifyError::UnknownKind("pager".to_string());
/// assert!(err.to_string().contains("pager"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The configured notifier kind is not one of the built-in channels.
    #[error("Notify: unknown notifier kind '{0}'")]
    UnknownKind(String),

    /// The HTTP request to the webhook endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook endpoint answered with a non-success status.
    #[error("Notify: webhook returned HTTP {status}")]
    UnexpectedStatus { status: u16 },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
