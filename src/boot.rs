// boot.rs

use esp_idf_hal::{delay::FreeRtos, prelude::Peripherals};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs,
    timer::{EspTaskTimerService, EspTimerService, Task},
    wifi::WifiDriver,
};
use esp_idf_sys::esp;
use log::*;
use tokio::sync::mpsc;

use crate::*;

/// Everything the tasks need once the platform is up.
pub struct Board {
    pub sysloop: EspSystemEventLoop,
    pub timer: EspTimerService<Task>,
    pub wifidriver: WifiDriver<'static>,
    pub state: Arc<Pin<Box<MyState>>>,
    pub outgoing: mpsc::Receiver<Outgoing>,
}

pub fn boot() -> anyhow::Result<Board> {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // eventfd is needed by our mio poll implementation.  Note you should set max_fds
    // higher if you have other code that may need eventfd.

    #[allow(clippy::needless_update)]
    let config = esp_idf_sys::esp_vfs_eventfd_config_t {
        max_fds: 1,
        ..Default::default()
    };
    esp! { unsafe { esp_idf_sys::esp_vfs_eventfd_register(&config) } }?;

    info!("Hello.");
    info!("Starting up, firmware v{FW_VERSION}");

    let sysloop = EspSystemEventLoop::take()?;
    let timer = EspTaskTimerService::new()?;
    // initializes nvs flash, the wifi driver keeps its calibration data there
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;

    let config = MyConfig::default();
    info!("My config:\n{config:#?}");

    let peripherals = Peripherals::take()?;
    let wifidriver = WifiDriver::new(peripherals.modem, sysloop.clone(), Some(nvs_default_partition))?;

    let (tx, rx) = mpsc::channel(QUEUE_LEN);
    let state = Arc::new(Box::pin(MyState::new(config, tx)));

    Ok(Board {
        sysloop,
        timer,
        wifidriver,
        state,
        outgoing: rx,
    })
}

pub fn reboot() -> ! {
    // not actually returning from main() but we reboot instead
    info!("main() finished, reboot.");
    FreeRtos::delay_ms(3000);
    esp_idf_hal::reset::restart();
}

// EOF
