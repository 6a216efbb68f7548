//! Launch the default media receiver and point it at a stream served by this host.
//!
//! Usage: cargo run --example cast_url -- <receiver-ip> <http-port> [mime]
//!
//! The HTTP server answering `http://<local-ip>:<http-port>/stream` is not
//! part of this program.

use castv2_sender::{
    CastChannel, Heartbeat, HeartbeatAction, HeartbeatMessage, DEFAULT_RECEIVER_ID,
    HEARTBEAT_TIMEOUT, NAMESPACE_MEDIA, NAMESPACE_RECEIVER,
};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let host = args.next().ok_or("missing receiver address")?;
    let http_port: u16 = args.next().ok_or("missing HTTP port")?.parse()?;
    let mime = args.next().unwrap_or_else(|| "audio/mpeg".to_string());

    let mut channel = CastChannel::connect(&host, None).await?;
    println!("Connected, local address {}", channel.local_ip());

    channel.send_connect(DEFAULT_RECEIVER_ID).await?;
    channel.launch_app().await?;

    let mut heartbeat = Heartbeat::new();
    let mut transport_id: Option<String> = None;

    loop {
        let envelope = match channel.receive_message(HEARTBEAT_TIMEOUT).await? {
            Some(envelope) => envelope,
            None => match heartbeat.on_timeout() {
                HeartbeatAction::SendPing => {
                    channel.send_ping().await?;
                    continue;
                }
                HeartbeatAction::ConnectionLost => {
                    println!("Receiver stopped answering");
                    break;
                }
            },
        };
        heartbeat.on_message();

        if HeartbeatMessage::from_envelope(&envelope) == Some(HeartbeatMessage::Ping) {
            channel.send_pong().await?;
            continue;
        }

        let Some(body) = envelope
            .payload_utf8()
            .and_then(|text| serde_json::from_str::<Value>(text).ok())
        else {
            continue;
        };

        match envelope.namespace.as_str() {
            NAMESPACE_RECEIVER if transport_id.is_none() => {
                let app = body["status"]["applications"]
                    .as_array()
                    .and_then(|apps| apps.first())
                    .and_then(|app| app["transportId"].as_str());
                if let Some(app) = app {
                    println!("Application ready on {}", app);
                    channel.send_connect(app).await?;
                    channel.load_media(app, http_port, &mime, None).await?;
                    transport_id = Some(app.to_string());
                }
            }
            NAMESPACE_MEDIA => {
                let session = body["status"]
                    .as_array()
                    .and_then(|status| status.first())
                    .and_then(|status| status["mediaSessionId"].as_i64());
                if let (Some(app), Some(session)) = (transport_id.as_deref(), session) {
                    if body["status"][0]["playerState"] == "PAUSED" {
                        channel.play(app, session).await?;
                    }
                    println!("Player state: {}", body["status"][0]["playerState"]);
                }
            }
            _ => {}
        }
    }

    if let Some(app) = transport_id.as_deref() {
        channel.send_close(app).await?;
    }
    channel.disconnect().await;
    Ok(())
}
