//! Typed request builders for every device command.
//!
//! Bodies stay structured until [`RequestBody::encode`] is called at the
//! transport boundary, so the shape of each command can be checked without
//! any string matching on hand-formatted payloads.

use serde::Serialize;
use strum::Display;
use strum::EnumString;

use crate::config::ClientConfig;
use crate::error::Error;

/// Ordered list of `(name, value)` header pairs.
pub type Headers = Vec<(String, String)>;

/// Temperatures are only accepted in multiples of this value.
pub const TEMPERATURE_STEP: u32 = 5;

const DEVICE_QUERY: &str = "query GetDevice($id: ID!) {
  getDevice(id: $id) {
    id
    thing_name
    device_name
    dealer_uuid
    city
    state
    street
    zip
    country
    firmware
    model
    dsn
    user_uuid
    connected_at
    key
    lat
    lng
    address
    vacation
    createdAt
    updatedAt
    activity {
      clientId
      serial_id
      timestamp
      eventType
    }
    shadow {
      heater_serial_number
      ayla_dsn
      rinnai_registered
      do_maintenance_retrieval
      model
      module_log_level
      set_priority_status
      set_recirculation_enable
      set_recirculation_enabled
      set_domestic_temperature
      set_operation_enabled
      schedule
      schedule_holiday
      schedule_enabled
      do_zigbee
      timezone
      timezone_encoded
      priority_status
      recirculation_enabled
      recirculation_duration
      lock_enabled
      operation_enabled
      module_firmware_version
      recirculation_not_configured
      maximum_domestic_temperature
      minimum_domestic_temperature
      createdAt
      updatedAt
    }
    monitoring {
      serial_id
      dealer_uuid
      user_uuid
      request_state
      createdAt
      updatedAt
    }
    schedule {
      items {
        id
        serial_id
        name
        schedule
        days
        times
        schedule_date
        active
        createdAt
        updatedAt
      }
      nextToken
    }
    info {
      serial_id
      ayla_dsn
      name
      domestic_combustion
      domestic_temperature
      wifi_ssid
      wifi_signal_strength
      wifi_channel_frequency
      local_ip
      public_ip
      ap_mac_addr
      recirculation_temperature
      recirculation_duration
      zigbee_inventory
      zigbee_status
      lime_scale_error
      mc__total_calories
      type
      unix_time
      m01_water_flow_rate_raw
      do_maintenance_retrieval
      aft_tml
      tot_cli
      unt_mmp
      aft_tmh
      bod_tmp
      m09_fan_current
      m02_outlet_temperature
      firmware_version
      bur_thm
      tot_clm
      exh_tmp
      m05_fan_frequency
      thermal_fuse_temperature
      m04_combustion_cycles
      hardware_version
      m11_heat_exchanger_outlet_temperature
      bur_tmp
      tot_wrl
      m12_bypass_servo_position
      m08_inlet_temperature
      m20_pump_cycles
      module_firmware_version
      error_code
      warning_code
      internal_temperature
      tot_wrm
      unknown_b
      rem_idn
      m07_water_flow_control_position
      operation_hours
      thermocouple
      tot_wrh
      recirculation_capable
      maintenance_list
      tot_clh
      temperature_table
      m19_pump_hours
      oem_host_version
      schedule_a_name
      zigbee_pairing_count
      schedule_c_name
      schedule_b_name
      model
      schedule_d_name
      total_bath_fill_volume
      dt
      createdAt
      updatedAt
    }
  }
}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Post,
    Patch,
}

/// Shadow attributes accepted by the legacy command endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    SetPriorityStatus,
    RecirculationDuration,
    SetRecirculationEnabled,
    SetDomesticTemperature,
}

/// A domestic hot water temperature the heater will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DomesticTemperature(u32);

impl DomesticTemperature {
    pub fn new(temperature: u32) -> Result<Self, Error> {
        if temperature % TEMPERATURE_STEP != 0 {
            return Err(Error::InvalidTemperatureIncrement { temperature });
        }
        Ok(Self(temperature))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DomesticTemperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Partial update of a device shadow document. Absent fields are left
/// untouched by the vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShadowUpdate {
    /// The vendor expects the duration as a string, unlike the other fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recirculation_duration: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_recirculation_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_domestic_temperature: Option<DomesticTemperature>,
}

impl ShadowUpdate {
    pub fn start_recirculation(duration: u32) -> Self {
        Self {
            recirculation_duration: Some(duration.to_string()),
            set_recirculation_enabled: Some(true),
            ..Self::default()
        }
    }

    pub fn stop_recirculation() -> Self {
        Self {
            set_recirculation_enabled: Some(false),
            ..Self::default()
        }
    }

    pub fn domestic_temperature(temperature: DomesticTemperature) -> Self {
        Self {
            set_domestic_temperature: Some(temperature),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// Form fields, percent-encoded on [`encode`](RequestBody::encode).
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Serialize the body into the string sent on the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            RequestBody::Json(value) => serde_json::to_string(value),
            RequestBody::Form(fields) => Ok(fields
                .iter()
                .map(|(name, value)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(name),
                        urlencoding::encode(value)
                    )
                })
                .collect::<Vec<_>>()
                .join("&")),
        }
    }
}

/// A single request ready to be handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: RequestBody,
}

impl CommandRequest {
    /// Look up a header value, ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn header(name: &str, value: impl Into<String>) -> (String, String) {
    (name.to_string(), value.into())
}

/// Headers for the shadow PATCH endpoint, carrying the bearer token.
pub fn shadow_headers(config: &ClientConfig, token: &str) -> Headers {
    vec![
        header("User-Agent", &config.user_agent),
        header("Content-Type", "application/x-www-form-urlencoded"),
        header("Authorization", format!("Bearer {}", token)),
        header("Accept-Encoding", "gzip"),
        header("Accept", "application/json, text/plain, */*"),
    ]
}

pub fn graphql_headers(config: &ClientConfig) -> Headers {
    let mut headers = vec![
        header("x-amz-user-agent", &config.graphql_user_agent),
        header("Content-Type", "application/json"),
    ];
    if let Some(api_key) = &config.graphql_api_key {
        headers.push(header("x-api-key", api_key));
    }
    headers
}

pub fn command_headers(config: &ClientConfig) -> Headers {
    vec![
        header("User-Agent", &config.user_agent),
        header("Content-Type", "application/x-www-form-urlencoded"),
    ]
}

/// POST the device query to the GraphQL endpoint.
pub fn device_info(config: &ClientConfig, headers: &Headers, device_id: &str) -> CommandRequest {
    CommandRequest {
        method: Method::Post,
        url: config.graphql_url.clone(),
        headers: headers.clone(),
        body: RequestBody::Json(serde_json::json!({
            "query": DEVICE_QUERY,
            "variables": { "id": device_id },
        })),
    }
}

/// PATCH a partial update onto a thing's shadow document.
pub fn shadow_patch(
    config: &ClientConfig,
    headers: &Headers,
    thing_name: &str,
    update: &ShadowUpdate,
) -> Result<CommandRequest, serde_json::Error> {
    Ok(CommandRequest {
        method: Method::Patch,
        url: config.shadow_url(thing_name),
        headers: headers.clone(),
        body: RequestBody::Json(serde_json::to_value(update)?),
    })
}

/// POST a single `attribute=value` command for a user's device.
pub fn attribute_command(
    config: &ClientConfig,
    headers: &Headers,
    user_uuid: &str,
    device_id: &str,
    attribute: Attribute,
    value: &str,
) -> CommandRequest {
    CommandRequest {
        method: Method::Post,
        url: config.command_url.clone(),
        headers: headers.clone(),
        body: RequestBody::Form(vec![
            ("user".to_string(), user_uuid.to_string()),
            ("thing".to_string(), device_id.to_string()),
            ("attribute".to_string(), attribute.to_string()),
            ("value".to_string(), value.to_string()),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_must_be_multiple_of_five() {
        assert_eq!(DomesticTemperature::new(120).unwrap().get(), 120);
        assert_eq!(DomesticTemperature::new(0).unwrap().get(), 0);

        let err = DomesticTemperature::new(121).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTemperatureIncrement { temperature: 121 }
        ));
        assert_eq!(
            err.to_string(),
            format!("temperature 121 is not a multiple of {}", TEMPERATURE_STEP)
        );
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(Attribute::SetPriorityStatus.to_string(), "set_priority_status");
        assert_eq!(
            Attribute::RecirculationDuration.to_string(),
            "recirculation_duration"
        );
        assert_eq!(
            "set_domestic_temperature".parse::<Attribute>().unwrap(),
            Attribute::SetDomesticTemperature
        );
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_shadow_update_skips_absent_fields() {
        let body = serde_json::to_string(&ShadowUpdate::start_recirculation(15)).unwrap();
        insta::assert_snapshot!(body, @r#"{"recirculation_duration":"15","set_recirculation_enabled":true}"#);

        let body = serde_json::to_string(&ShadowUpdate::stop_recirculation()).unwrap();
        insta::assert_snapshot!(body, @r#"{"set_recirculation_enabled":false}"#);

        let temperature = DomesticTemperature::new(125).unwrap();
        let body = serde_json::to_string(&ShadowUpdate::domestic_temperature(temperature)).unwrap();
        insta::assert_snapshot!(body, @r#"{"set_domestic_temperature":125}"#);
    }

    #[test]
    fn test_form_body_is_percent_encoded() {
        let config = ClientConfig::default();
        let request = attribute_command(
            &config,
            &command_headers(&config),
            "user 1",
            "dev&1",
            Attribute::SetRecirculationEnabled,
            "true",
        );

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, config.command_url);
        insta::assert_snapshot!(
            request.body.encode().unwrap(),
            @"user=user%201&thing=dev%261&attribute=set_recirculation_enabled&value=true"
        );
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let config = ClientConfig::default();
        let request = device_info(&config, &graphql_headers(&config), "abc123");

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.header("X-Amz-User-Agent"),
            Some("aws-amplify/3.4.3 react-native")
        );
        assert_eq!(request.header("x-api-key"), None);
    }

    #[test]
    fn test_graphql_headers_include_configured_api_key() {
        let config = ClientConfig {
            graphql_api_key: Some("secret-key".to_string()),
            ..ClientConfig::default()
        };
        let headers = graphql_headers(&config);
        assert!(headers.contains(&("x-api-key".to_string(), "secret-key".to_string())));
    }

    #[test]
    fn test_shadow_headers_carry_bearer_token() {
        let config = ClientConfig::default();
        let headers = shadow_headers(&config, "tok");
        let request = shadow_patch(
            &config,
            &headers,
            "thing-1",
            &ShadowUpdate::stop_recirculation(),
        )
        .unwrap();

        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        assert_eq!(request.header("accept-encoding"), Some("gzip"));
        assert_eq!(
            request.url,
            "https://698suy4zs3.execute-api.us-east-1.amazonaws.com/Prod/thing/thing-1/shadow"
        );
    }
}
