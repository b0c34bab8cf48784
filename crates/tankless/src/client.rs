//! Command client for the water heater cloud API.
//!
//! Three request surfaces are used:
//! - a GraphQL endpoint returning full device info,
//! - the shadow REST endpoint, PATCHed with partial JSON updates,
//! - the legacy command endpoint, POSTed one `attribute=value` at a time.

use tracing::debug;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::request;
use crate::request::Attribute;
use crate::request::DomesticTemperature;
use crate::request::Headers;
use crate::request::ShadowUpdate;
use crate::transport::Transport;
use crate::transport::TransportResponse;

/// Builds device commands and dispatches them through a [`Transport`].
///
/// The client holds no mutable state, so any number of calls may run
/// concurrently against the same instance.
pub struct DeviceCommandClient<T: Transport> {
    transport: T,
    config: ClientConfig,
    /// Shadow PATCH headers, carrying the bearer token
    headers: Headers,
    graphql_headers: Headers,
    command_headers: Headers,
}

impl<T: Transport> std::fmt::Debug for DeviceCommandClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Headers are left out so the token never ends up in logs
        f.debug_struct("DeviceCommandClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DeviceCommandClient<T> {
    /// Create a client against the production endpoints
    ///
    /// The default configuration carries no GraphQL API key, so
    /// [`get_device_info`](Self::get_device_info) will not authenticate
    /// until `graphql_api_key` is set through [`with_config`](Self::with_config).
    /// The shadow and command surfaces only need the bearer token.
    pub fn new(transport: T, token: &str) -> Self {
        Self::with_config(transport, token, ClientConfig::default())
    }

    pub fn with_config(transport: T, token: &str, config: ClientConfig) -> Self {
        let headers = request::shadow_headers(&config, token);
        let graphql_headers = request::graphql_headers(&config);
        let command_headers = request::command_headers(&config);

        Self {
            transport,
            config,
            headers,
            graphql_headers,
            command_headers,
        }
    }

    /// Fetch the full device document. The response is returned unparsed.
    pub async fn get_device_info(&self, device_id: &str) -> Result<TransportResponse> {
        debug!("Fetching device info for {}", device_id);
        let req = request::device_info(&self.config, &self.graphql_headers, device_id);
        Ok(self.transport.send(req).await?)
    }

    /// Enable recirculation for `duration` in a single shadow update
    pub async fn patch_recirculation(
        &self,
        thing_name: &str,
        duration: u32,
    ) -> Result<TransportResponse> {
        info!("[{}] Patching recirculation on for {}", thing_name, duration);
        self.patch_shadow(thing_name, &ShadowUpdate::start_recirculation(duration))
            .await
    }

    pub async fn patch_stop_recirculation(&self, thing_name: &str) -> Result<TransportResponse> {
        info!("[{}] Patching recirculation off", thing_name);
        self.patch_shadow(thing_name, &ShadowUpdate::stop_recirculation())
            .await
    }

    /// Set the domestic temperature through the shadow endpoint
    ///
    /// Returns [`Error::InvalidTemperatureIncrement`](crate::Error::InvalidTemperatureIncrement)
    /// without sending anything when `temperature` is not a multiple of 5.
    pub async fn patch_set_temperature(
        &self,
        thing_name: &str,
        temperature: u32,
    ) -> Result<TransportResponse> {
        let temperature = DomesticTemperature::new(temperature)?;
        info!("[{}] Patching domestic temperature to {}", thing_name, temperature);
        self.patch_shadow(thing_name, &ShadowUpdate::domestic_temperature(temperature))
            .await
    }

    async fn patch_shadow(
        &self,
        thing_name: &str,
        update: &ShadowUpdate,
    ) -> Result<TransportResponse> {
        let req = request::shadow_patch(&self.config, &self.headers, thing_name, update)?;
        Ok(self.transport.send(req).await?)
    }

    /// Start recirculation through the legacy command endpoint
    ///
    /// Sends priority status, duration and enable as three commands, each
    /// awaited before the next. The first failure is returned as-is and the
    /// remaining commands are not sent. Earlier commands are not rolled back.
    pub async fn start_recirculation(
        &self,
        user_uuid: &str,
        device_id: &str,
        duration: u32,
    ) -> Result<()> {
        info!("[{}] Starting recirculation for {}", device_id, duration);

        let duration = duration.to_string();
        let steps = [
            (Attribute::SetPriorityStatus, "true"),
            (Attribute::RecirculationDuration, duration.as_str()),
            (Attribute::SetRecirculationEnabled, "true"),
        ];
        for (attribute, value) in steps {
            self.send_attribute(user_uuid, device_id, attribute, value)
                .await?;
        }

        Ok(())
    }

    pub async fn stop_recirculation(&self, user_uuid: &str, device_id: &str) -> Result<()> {
        info!("[{}] Stopping recirculation", device_id);
        self.send_attribute(
            user_uuid,
            device_id,
            Attribute::SetRecirculationEnabled,
            "false",
        )
        .await?;
        Ok(())
    }

    /// Set the domestic temperature through the legacy command endpoint
    ///
    /// Rejects temperatures that are not a multiple of 5 before sending.
    pub async fn set_temperature(
        &self,
        user_uuid: &str,
        device_id: &str,
        temperature: u32,
    ) -> Result<()> {
        let temperature = DomesticTemperature::new(temperature)?;
        info!("[{}] Setting domestic temperature to {}", device_id, temperature);
        self.send_attribute(
            user_uuid,
            device_id,
            Attribute::SetDomesticTemperature,
            &temperature.to_string(),
        )
        .await?;
        Ok(())
    }

    /// Send a single `attribute=value` command for a user's device
    pub async fn send_attribute(
        &self,
        user_uuid: &str,
        device_id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<TransportResponse> {
        debug!("[{}] Sending {}={}", device_id, attribute, value);
        let req = request::attribute_command(
            &self.config,
            &self.command_headers,
            user_uuid,
            device_id,
            attribute,
            value,
        );
        Ok(self.transport.send(req).await?)
    }
}
