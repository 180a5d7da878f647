// wifi.rs

use std::sync::Arc;

use anyhow::anyhow;
use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_svc::{
    eventloop::{EspEventLoop, System},
    ipv4,
    netif::{self, EspNetif},
    timer::{EspTimerService, Task},
    wifi::{AsyncWifi, EspWifi, WifiDriver},
};
use log::*;
use tokio::time::Duration;

use crate::*;

const IP_WAIT_TIMEOUT: u64 = 30;

pub struct WifiLoop {
    pub state: Arc<std::pin::Pin<Box<MyState>>>,
}

impl WifiLoop {
    pub async fn run(
        self,
        wifidriver: WifiDriver<'_>,
        sysloop: EspEventLoop<System>,
        timer: EspTimerService<Task>,
    ) -> anyhow::Result<()> {
        info!("Initializing Wi-Fi...");

        let net_if = EspNetif::new_with_conf(&netif::NetifConfiguration {
            ip_configuration: ipv4::Configuration::Client(ipv4::ClientConfiguration::DHCP(
                ipv4::DHCPClientSettings::default(),
            )),
            ..netif::NetifConfiguration::wifi_default_client()
        })?;

        let mac = net_if.get_mac()?;
        info!("MAC Address: {}", mac_string(&mac));
        *self.state.myid.write().await = device_id(&mac);

        let espwifi = EspWifi::wrap_all(wifidriver, net_if, EspNetif::new(netif::NetifStack::Ap)?)?;
        let mut wifi = AsyncWifi::wrap(espwifi, sysloop, timer.clone())?;

        Box::pin(self.configure(&mut wifi)).await?;
        info!("wifi_init_sta finished.");

        self.stay_connected(&mut wifi).await
    }

    pub async fn configure(&self, wifi: &mut AsyncWifi<EspWifi<'_>>) -> anyhow::Result<()> {
        let config = &self.state.config;
        info!("WiFi setting credentials for {:?}...", config.wifi_ssid);

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID too long: {:?}", config.wifi_ssid))?,
            password: config
                .wifi_pass
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            auth_method: config.auth_method(),
            ..Default::default()
        }))?;

        info!("WiFi driver starting...");
        Ok(Box::pin(wifi.start()).await?)
    }

    // Reconnects forever, no backoff.
    async fn stay_connected(self, wifi: &mut AsyncWifi<EspWifi<'_>>) -> anyhow::Result<()> {
        loop {
            // returns at once while we are not associated yet
            Box::pin(wifi.wifi_wait(|w| w.is_up(), None)).await.ok();

            if *self.state.wifi_up.read().await {
                *self.state.wifi_up.write().await = false;
                info!("Disconnected. Retrying...");
            }

            info!("Connecting...");
            if let Err(e) = Box::pin(wifi.connect()).await {
                error!("WiFi connect error: {e:?}");
                info!("Disconnected. Retrying...");
                continue;
            }

            info!("WiFi waiting for IP address...");
            if let Err(e) = Box::pin(wifi.ip_wait_while(
                |w| w.is_up().map(|s| !s),
                Some(Duration::from_secs(IP_WAIT_TIMEOUT)),
            ))
            .await
            {
                error!("WiFi error: {e:?}");
                Box::pin(wifi.disconnect()).await.ok();
                info!("Disconnected. Retrying...");
                continue;
            }

            let netif = wifi.wifi().sta_netif();
            let ip_info = netif.get_ip_info()?;
            info!("Connected with IP Address: {}", ip_info.ip);

            *self.state.if_index.write().await = netif.get_index();
            *self.state.wifi_up.write().await = true;
        }
    }
}

// EOF
