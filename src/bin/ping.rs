// bin/ping.rs

#![warn(clippy::large_futures)]

use esp32pingmqtt::*;
use esp_idf_sys::esp_app_desc;
use log::*;

esp_app_desc!();

fn main() -> anyhow::Result<()> {
    let Board {
        sysloop,
        timer,
        wifidriver,
        state,
        outgoing,
    } = boot()?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(async move {
            let wifi_loop = WifiLoop { state: state.clone() };

            info!("Entering main loop...");
            tokio::select! {
                r = Box::pin(run_mqtt(state.clone(), outgoing)) => { error!("run_mqtt() ended: {r:?}"); }
                r = Box::pin(wifi_loop.run(wifidriver, sysloop, timer)) => { error!("wifi_loop.run() ended: {r:?}"); }
                r = Box::pin(pinger(state.clone())) => { error!("pinger() ended: {r:?}"); }
            };
        }));

    reboot()
}

// EOF
