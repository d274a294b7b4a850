use thiserror::Error;

/// Errors from fact extraction or classification backends.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("malformed extraction output: {0}")]
    Malformed(String),

    #[error("quota exhausted")]
    QuotaExhausted,

    #[error("rate limited")]
    RateLimited { retry_after_ms: Option<u64> },

    /// The circuit breaker skipped the call while in cooldown.
    #[error("llm calls disabled by cooldown")]
    Disabled,
}

/// Errors from persistence, dataset, and notification sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("notice not found")]
    NoticeNotFound,
}

/// Failure to reverse-parse a rendered order notice.
///
/// Always handled silently: an unparseable reply falls through to normal
/// ingestion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoticeParseError {
    #[error("not an order notice")]
    NotAnOrderNotice,

    #[error("order notice has no id")]
    MissingOrderId,
}
