use crate::request::TEMPERATURE_STEP;
use crate::transport::TransportError;

/// Errors returned by [`DeviceCommandClient`](crate::DeviceCommandClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The heater only accepts domestic temperatures in fixed increments.
    #[error("temperature {temperature} is not a multiple of {step}", step = TEMPERATURE_STEP)]
    InvalidTemperatureIncrement { temperature: u32 },

    #[error("Failed to encode shadow update: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
