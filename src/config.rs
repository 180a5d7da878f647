// config.rs

use std::net;

use anyhow::bail;
use esp_idf_svc::wifi::AuthMethod;

const DEFAULT_WIFI_SSID: &str = "CMU-DEVICE";
const DEFAULT_MQTT_URL: &str = "mqtt://172.26.49.86";
const DEFAULT_MQTT_TOPIC: &str = "test/topic";
const DEFAULT_PING_IP: &str = "172.26.49.86";

const DEFAULT_PING_DELAY: u64 = 5;
const DEFAULT_PING_TIMEOUT: u64 = 1;
const DEFAULT_MQTT_KEEPALIVE: u64 = 25;

// these are baked in at build time, see build.rs
#[derive(Clone, Debug)]
pub struct MyConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub mqtt_url: String,
    pub mqtt_topic: String,
    pub mqtt_keepalive: u64,

    pub ping_ip: String,
    pub ping_delay: u64,
    pub ping_timeout: u64,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or(DEFAULT_WIFI_SSID).into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("").into(),

            mqtt_url: option_env!("MQTT_URL").unwrap_or(DEFAULT_MQTT_URL).into(),
            mqtt_topic: option_env!("MQTT_TOPIC").unwrap_or(DEFAULT_MQTT_TOPIC).into(),
            mqtt_keepalive: DEFAULT_MQTT_KEEPALIVE,

            ping_ip: option_env!("PING_IP").unwrap_or(DEFAULT_PING_IP).into(),
            ping_delay: DEFAULT_PING_DELAY,
            ping_timeout: DEFAULT_PING_TIMEOUT,
        }
    }
}

impl MyConfig {
    /// Open networks are joined without a password, anything else is WPA2.
    pub fn auth_method(&self) -> AuthMethod {
        if self.wifi_pass.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        }
    }

    pub fn ping_target(&self) -> anyhow::Result<net::Ipv4Addr> {
        match self.ping_ip.parse() {
            Ok(ip) => Ok(ip),
            Err(e) => bail!("Invalid ping target {:?}: {e}", self.ping_ip),
        }
    }
}


// EOF
