// state.rs

use crate::*;

use tokio::sync::{mpsc, RwLock};

pub const DEFAULT_ID: &str = "esp32pingmqtt";

/// Messages waiting for the MQTT publisher.
#[derive(Clone, Debug, PartialEq)]
pub enum Outgoing {
    Notice,
    Ping(PingMsg),
}

pub struct MyState {
    pub config: MyConfig,
    pub wifi_up: RwLock<bool>,
    pub if_index: RwLock<u32>,
    pub myid: RwLock<String>,
    pub mqtt_up: RwLock<bool>,
    pub outgoing: mpsc::Sender<Outgoing>,
}

impl MyState {
    pub fn new(config: MyConfig, outgoing: mpsc::Sender<Outgoing>) -> Self {
        MyState {
            config,
            wifi_up: RwLock::new(false),
            if_index: RwLock::new(0),
            myid: RwLock::new(DEFAULT_ID.into()),
            mqtt_up: RwLock::new(false),
            outgoing,
        }
    }

    pub async fn wait_for_wifi(&self) {
        while !*self.wifi_up.read().await {
            sleep(Duration::from_secs(1)).await;
        }
    }
}

pub fn device_id(mac: &[u8; 6]) -> String {
    format!(
        "{DEFAULT_ID}-{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5],
    )
}

/// Lowercase colon separated, the way the station tools print it.
pub fn mac_string(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_from_mac() {
        let mac = [0x24, 0x6f, 0x28, 0x0a, 0xb1, 0x03];
        assert_eq!(device_id(&mac), "esp32pingmqtt-24:6F:28:0A:B1:03");
    }

    #[test]
    fn mac_is_printed_bare() {
        let mac = [0x24, 0x6f, 0x28, 0x0a, 0xb1, 0x03];
        assert_eq!(mac_string(&mac), "24:6f:28:0a:b1:03");
    }

    #[test]
    fn fresh_state_is_offline() {
        let (tx, _rx) = mpsc::channel(1);
        let state = MyState::new(MyConfig::default(), tx);
        assert!(!*state.wifi_up.try_read().unwrap());
        assert!(!*state.mqtt_up.try_read().unwrap());
        assert_eq!(*state.if_index.try_read().unwrap(), 0);
        assert_eq!(*state.myid.try_read().unwrap(), DEFAULT_ID);
    }
}
// EOF
