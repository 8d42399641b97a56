use {dropfarm_common::FromMessage, thiserror::Error};

/// Listener-side errors. All of these are terminal for the gateway
/// connection; outbound call failures live in `dropfarm_panels::Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// The gateway rejected the identify payload (close code 4004).
    #[error("gateway authentication rejected")]
    AuthRejected,

    /// Transport-level failure before or during the read loop.
    #[error("gateway connection failed: {context}: {source}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn connection(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

dropfarm_common::impl_context!();
