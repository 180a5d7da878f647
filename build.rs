// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554

    embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
    embuild::build::LinkArgs::output_propagated("ESP_IDF")?;

    for (name, default) in [
        ("WIFI_SSID", "CMU-DEVICE"),
        ("WIFI_PASS", ""),
        ("MQTT_URL", "mqtt://172.26.49.86"),
        ("MQTT_TOPIC", "test/topic"),
        ("PING_IP", "172.26.49.86"),
    ] {
        let value = env::var(name).unwrap_or_else(|_| default.into());
        println!("cargo:rustc-env={name}={value}");
        println!("cargo:rerun-if-env-changed={name}");
    }

    Ok(())
}

// EOF
