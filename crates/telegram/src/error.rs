use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered but with `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),
}
