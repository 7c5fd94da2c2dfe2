//! Per-guest connection handler: one WebSocket, one bridge session.
//!
//! Frames are mapped onto window/port messages, the session is ticked for
//! liveness, and captured-port traffic is pumped back out. The connection
//! never trusts frame contents for identity: the origin checked by the
//! bridge is the one captured at the WebSocket upgrade.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use scribe_bridge::{
    channel, BridgeConfig, BridgeSession, HostHandles, Port, PortMessage, WindowMessage,
};
use scribe_common::SessionId;
use scribe_config::ScribeConfig;

use crate::host::{
    FrameNavigator, FrameWindow, LoggedDirtyState, LoggedDispatch, PortTable, StaticHostStatus,
};
use crate::protocol::{InboundFrame, OutboundFrame};

/// How often the session is driven when no traffic arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Handle a single guest WebSocket connection to completion.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    origin: Option<String>,
    config: ScribeConfig,
) {
    let session_id = SessionId::new();
    let origin = origin.unwrap_or_default();
    let (mut sink, mut stream) = ws.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let table = Arc::new(PortTable::new());

    let hosts = HostHandles {
        navigator: Arc::new(FrameNavigator::new(out_tx.clone())),
        dirty: Arc::new(LoggedDirtyState::default()),
        dispatch: Arc::new(LoggedDispatch),
        status: Arc::new(StaticHostStatus::new(
            &config.guest.admin_url,
            &config.gateway.host_origin,
        )),
        window: Arc::new(FrameWindow::new(out_tx.clone(), Arc::clone(&table))),
    };
    let bridge_config = BridgeConfig {
        admin_url: config.guest.admin_url.clone(),
        auth_param: config.guest.auth_param.clone(),
        stage1_timeout: Duration::from_millis(config.liveness.stage1_timeout_ms),
        stage2_timeout: Duration::from_millis(config.liveness.stage2_timeout_ms),
    };
    let mut session = BridgeSession::new(bridge_config, hosts);

    tracing::info!(
        peer = %addr,
        session = %session_id.short(),
        origin = %origin,
        "guest connected"
    );

    let mut tick = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            // Host-side frames → guest
            Some(frame) = out_rx.recv() => {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(error = %e, "unserializable outbound frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            // Liveness + pending control traffic
            _ = tick.tick() => {
                session.poll();
                for event in session.drain_events() {
                    tracing::info!(
                        session = %session_id.short(),
                        event = ?event,
                        "guest request awaiting host flow"
                    );
                }
            }

            // Guest frames
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&mut session, &origin, &table, &out_tx, &text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %addr, session = %session_id.short(), "guest disconnected");
    session.shutdown();
    table.close_all();
}

/// Decode one inbound frame and feed it to the session.
fn handle_frame(
    session: &mut BridgeSession,
    origin: &str,
    table: &PortTable,
    out: &UnboundedSender<OutboundFrame>,
    text: &str,
) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable frame, ignoring");
            return;
        }
    };

    match frame {
        InboundFrame::FrameLoad => session.frame_loaded(),
        InboundFrame::Window { data, ports } => {
            let ports = materialize_ports(ports, out);
            session.handle_window_message(WindowMessage {
                origin: origin.to_string(),
                data,
                ports,
            });
        }
        InboundFrame::Port { port, data, ports } => {
            let ports = materialize_ports(ports, out);
            if !table.post(port, PortMessage { data, ports }) {
                tracing::debug!(port, "frame for unknown port, ignoring");
            }
            // Deliver without waiting for the next tick.
            session.poll();
        }
        InboundFrame::Unknown => tracing::debug!("unknown frame type, ignoring"),
    }
}

/// Turn guest-allocated endpoint IDs into live pipes: the sending halves go
/// to the session, the receiving halves are pumped back out as port frames.
fn materialize_ports(ids: Vec<u64>, out: &UnboundedSender<OutboundFrame>) -> Vec<Port> {
    ids.into_iter()
        .map(|id| {
            let (port, mut rx) = channel();
            let out = out.clone();
            tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    if out.send(OutboundFrame::Port { port: id, data: msg.data }).is_err() {
                        return;
                    }
                }
                let _ = out.send(OutboundFrame::PortClose { port: id });
            });
            port
        })
        .collect()
}
