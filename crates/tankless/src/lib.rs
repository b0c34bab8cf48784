//! Asynchronous command client for cloud-connected tankless water heaters.
//!
//! Requests are built as typed [`CommandRequest`] values and handed to an
//! injected [`Transport`]. The client itself keeps no state besides the
//! credentials baked into its header sets.

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod transport;

pub use client::DeviceCommandClient;
pub use config::ClientConfig;
pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use error::Error;
pub use error::Result;
pub use request::Attribute;
pub use request::CommandRequest;
pub use request::DomesticTemperature;
pub use request::Method;
pub use request::RequestBody;
pub use request::ShadowUpdate;
pub use transport::DryRunTransport;
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use transport::TransportError;
pub use transport::TransportResponse;
