// mqtt.rs

use esp_idf_svc::mqtt::{self, client::EventPayload};
use log::*;
use tokio::sync::mpsc;

use crate::*;

pub const NOTICE: &str = "ESP CONNECTED";
pub const QUEUE_LEN: usize = 8;

pub fn notice_payload() -> &'static [u8] {
    NOTICE.as_bytes()
}

impl Outgoing {
    pub fn payload(&self) -> &[u8] {
        match self {
            Outgoing::Notice => notice_payload(),
            Outgoing::Ping(msg) => msg.as_bytes(),
        }
    }
}

pub async fn run_mqtt(state: Arc<Pin<Box<MyState>>>, rx: mpsc::Receiver<Outgoing>) -> anyhow::Result<()> {
    // the client is started once we have an address
    state.wait_for_wifi().await;

    let myid = state.myid.read().await.clone();
    let url = &state.config.mqtt_url;
    info!("MQTT starting client {myid} for {url}");

    let (client, conn) = mqtt::client::EspAsyncMqttClient::new(
        url,
        &mqtt::client::MqttClientConfiguration {
            client_id: Some(&myid),
            keep_alive_interval: Some(Duration::from_secs(state.config.mqtt_keepalive)),
            ..Default::default()
        },
    )?;

    // esp-mqtt reconnects by itself, the client lives as long as we do
    tokio::select! {
        _ = Box::pin(event_loop(state.clone(), conn)) => {}
        _ = Box::pin(publisher(state.clone(), client, rx)) => {}
    };
    anyhow::bail!("MQTT client stopped")
}

/// The events the firmware reacts to, everything else is only logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MqttEvent {
    Connected,
    Disconnected,
    Other,
}

impl MqttEvent {
    pub fn from_payload<E: std::fmt::Debug>(payload: &EventPayload<'_, E>) -> Self {
        match payload {
            EventPayload::Connected(_) => MqttEvent::Connected,
            EventPayload::Disconnected => MqttEvent::Disconnected,
            _ => MqttEvent::Other,
        }
    }
}

pub async fn on_event(state: &MyState, event: MqttEvent) {
    match event {
        MqttEvent::Connected => {
            info!("MQTT connected. Publishing message...");
            *state.mqtt_up.write().await = true;
            // never block the event loop on a busy publisher
            if let Err(e) = state.outgoing.try_send(Outgoing::Notice) {
                error!("Cannot queue connect notice: {e}");
            }
        }
        MqttEvent::Disconnected => {
            info!("MQTT disconnected.");
            *state.mqtt_up.write().await = false;
        }
        MqttEvent::Other => {}
    }
}

async fn event_loop(state: Arc<Pin<Box<MyState>>>, mut conn: mqtt::client::EspAsyncMqttConnection) {
    while let Ok(event) = Box::pin(conn.next()).await {
        let payload = event.payload();
        info!("MQTT event: {payload:?}");
        on_event(&state, MqttEvent::from_payload(&payload)).await;
    }
    error!("MQTT connection closed.");
}

async fn publisher(
    state: Arc<Pin<Box<MyState>>>,
    mut client: mqtt::client::EspAsyncMqttClient,
    mut rx: mpsc::Receiver<Outgoing>,
) {
    let topic = &state.config.mqtt_topic;

    while let Some(msg) = rx.recv().await {
        info!("MQTT sending {topic}");
        if let Err(e) = client
            .publish(topic, mqtt::client::QoS::AtLeastOnce, false, msg.payload())
            .await
        {
            error!("MQTT send error: {e}");
        }
    }
    error!("MQTT outgoing queue closed.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state(queue_len: usize) -> (MyState, mpsc::Receiver<Outgoing>) {
        let (tx, rx) = mpsc::channel(queue_len);
        (MyState::new(MyConfig::default(), tx), rx)
    }

    #[test]
    fn notice_payload_is_fixed() {
        assert_eq!(Outgoing::Notice.payload(), b"ESP CONNECTED");
    }

    #[test]
    fn ping_payload_is_the_rendered_report() {
        let mut msg = PingMsg::new();
        PingReport::new(net::Ipv4Addr::new(10, 0, 0, 1), Some(Duration::from_millis(42)))
            .render(&mut msg)
            .unwrap();
        assert_eq!(Outgoing::Ping(msg).payload(), b"42.000");
    }

    #[tokio::test]
    async fn connect_queues_notice_and_marks_up() {
        let (state, mut rx) = new_state(QUEUE_LEN);

        on_event(&state, MqttEvent::Connected).await;

        assert!(*state.mqtt_up.read().await);
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Notice);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_reconnect_queues_another_notice() {
        let (state, mut rx) = new_state(QUEUE_LEN);

        on_event(&state, MqttEvent::Connected).await;
        on_event(&state, MqttEvent::Disconnected).await;
        on_event(&state, MqttEvent::Connected).await;

        assert_eq!(rx.try_recv().unwrap(), Outgoing::Notice);
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Notice);
    }

    #[tokio::test]
    async fn disconnect_marks_down() {
        let (state, mut rx) = new_state(QUEUE_LEN);
        *state.mqtt_up.write().await = true;

        on_event(&state, MqttEvent::Disconnected).await;

        assert!(!*state.mqtt_up.read().await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn other_events_change_nothing() {
        let (state, mut rx) = new_state(QUEUE_LEN);

        on_event(&state, MqttEvent::Other).await;

        assert!(!*state.mqtt_up.read().await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn connect_with_full_queue_does_not_block() {
        let (state, mut rx) = new_state(1);
        state.outgoing.try_send(Outgoing::Notice).unwrap();

        // returns even though there is no room for the notice
        on_event(&state, MqttEvent::Connected).await;

        assert!(*state.mqtt_up.read().await);
        assert_eq!(rx.try_recv().unwrap(), Outgoing::Notice);
        assert!(rx.try_recv().is_err());
    }
}

// EOF
