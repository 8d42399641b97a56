use std::error::Error as StdError;

/// Crate-wide result type for panel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by the panel service and the action adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Outbound call failed in transit (network, timeout).
    #[error("delivery failed: {context}: {source}")]
    Delivery {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Outbound call was answered with a non-success status.
    #[error("delivery rejected: {context}: status {status}")]
    DeliveryStatus { context: String, status: u16 },

    /// Panel is missing a field required by this operation.
    #[error("panel misconfigured: {message}")]
    Configuration { message: String },

    /// No panel with the requested id.
    #[error("panel not found: {panel_id}")]
    NotFound { panel_id: String },

    /// Input payload or parameter is invalid.
    #[error("invalid panel input: {message}")]
    InvalidInput { message: String },
}

impl Error {
    #[must_use]
    pub fn delivery(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Delivery {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn delivery_status(context: impl Into<String>, status: u16) -> Self {
        Self::DeliveryStatus {
            context: context.into(),
            status,
        }
    }

    #[must_use]
    pub fn configuration(message: impl std::fmt::Display) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(panel_id: impl Into<String>) -> Self {
        Self::NotFound {
            panel_id: panel_id.into(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    /// True for failures isolated to one outbound call.
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::DeliveryStatus { .. })
    }
}
