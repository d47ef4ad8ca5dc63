/// Core error type.
///
/// Adapter crates map their platform errors into this type so the command layer
/// can tell a recoverable delivery refusal (`Forbidden`) from a fatal fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ticket store error: {0}")]
    Store(String),

    #[error("transcript generation failed: {0}")]
    Generation(String),

    /// The recipient's privacy settings refuse messages from the bot.
    #[error("delivery refused by recipient: {0}")]
    Forbidden(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
