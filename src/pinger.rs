// pinger.rs

use std::fmt::{self, Write};

use esp_idf_svc::ping;
use log::*;

use crate::*;

pub const PING_MSG_LEN: usize = 64;
const PING_DATA_SIZE: u32 = 64;

pub type PingMsg = heapless::String<PING_MSG_LEN>;

/// Outcome of a single echo request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PingReport {
    Reply { target: net::Ipv4Addr, rtt: Duration },
    Timeout { target: net::Ipv4Addr },
}

impl PingReport {
    pub fn new(target: net::Ipv4Addr, rtt: Option<Duration>) -> Self {
        match rtt {
            Some(rtt) => PingReport::Reply { target, rtt },
            None => PingReport::Timeout { target },
        }
    }

    /// MQTT payload: bare round-trip time in milliseconds, e.g. `12.345`.
    /// Timeouts have no payload and leave the buffer empty.
    pub fn render(&self, buf: &mut PingMsg) -> fmt::Result {
        buf.clear();
        match self {
            PingReport::Reply { rtt, .. } => {
                let us = rtt.as_micros();
                write!(buf, "{}.{:03}", us / 1000, us % 1000)
            }
            PingReport::Timeout { .. } => Ok(()),
        }
    }
}

// log line only, consumers get the bare number from render()
impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PingReport::Reply { target, rtt } => {
                let us = rtt.as_micros();
                write!(f, "ping {target}: {}.{:03} ms", us / 1000, us % 1000)
            }
            PingReport::Timeout { target } => write!(f, "ping {target}: timeout"),
        }
    }
}

/// Queue a report for the publisher. Returns true if it was queued.
pub async fn queue_report(state: &MyState, report: &PingReport, msg: &mut PingMsg) -> bool {
    info!("{report}");

    if let PingReport::Timeout { .. } = report {
        return false;
    }
    if !*state.mqtt_up.read().await {
        info!("MQTT is down, dropping ping report.");
        return false;
    }
    if report.render(msg).is_err() {
        error!("Ping report does not fit in {PING_MSG_LEN} bytes");
        return false;
    }

    match state.outgoing.try_send(Outgoing::Ping(msg.clone())) {
        Ok(()) => true,
        Err(e) => {
            error!("Cannot queue ping report: {e}");
            false
        }
    }
}

pub async fn pinger(state: Arc<Pin<Box<MyState>>>) -> anyhow::Result<()> {
    let target = state.config.ping_target()?;
    let conf = ping::Configuration {
        count: 1,
        interval: Duration::from_secs(1),
        timeout: Duration::from_secs(state.config.ping_timeout),
        data_size: PING_DATA_SIZE,
        tos: 0,
    };
    let mut msg = PingMsg::new();

    state.wait_for_wifi().await;

    loop {
        sleep(Duration::from_secs(state.config.ping_delay)).await;

        let if_idx = *state.if_index.read().await;
        if if_idx == 0 {
            error!("No if_index. wat?");
            continue;
        }

        let report = match ping_once(if_idx, target, &conf) {
            Ok(r) => r,
            Err(e) => {
                error!("Ping {target} failed: {e:?}");
                continue;
            }
        };

        queue_report(&state, &report, &mut msg).await;
    }
}

fn ping_once(
    if_idx: u32,
    target: net::Ipv4Addr,
    conf: &ping::Configuration,
) -> anyhow::Result<PingReport> {
    let mut rtt = None;
    let mut ping = ping::EspPing::new(if_idx);
    let summary = ping.ping_details(target, conf, |_summary, reply| {
        if let ping::Reply::Success(info) = reply {
            rtt = Some(info.elapsed_time);
        }
    })?;

    if rtt.is_none() && summary.received > 0 {
        rtt = Some(summary.time);
    }
    Ok(PingReport::new(target, rtt))
}


// EOF
