//! Integration tests for the Cast channel.
//!
//! The receiver is played by the far end of an in-memory duplex pipe, which
//! reads the frames the channel writes and decodes them back into envelopes.

use castv2_sender::{
    decode_body, encode_frame, CastChannel, CastError, ChannelConfig, Envelope, MediaMetadata,
    Payload, DEFAULT_RECEIVER_ID, DEFAULT_SOURCE_ID, NAMESPACE_CONNECTION, NAMESPACE_DEVICE_AUTH,
    NAMESPACE_HEARTBEAT, NAMESPACE_MEDIA, NAMESPACE_RECEIVER,
};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

const LOCAL_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
const APP: &str = "web-5";

fn channel() -> (CastChannel<DuplexStream>, DuplexStream) {
    let (client, device) = tokio::io::duplex(64 * 1024);
    let channel = CastChannel::from_stream(client, LOCAL_IP, ChannelConfig::default());
    (channel, device)
}

async fn read_frame(device: &mut DuplexStream) -> Envelope {
    let mut header = [0u8; 4];
    device.read_exact(&mut header).await.unwrap();
    let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
    device.read_exact(&mut body).await.unwrap();
    decode_body(&body).unwrap()
}

fn payload_json(envelope: &Envelope) -> Value {
    serde_json::from_str(envelope.payload_utf8().unwrap()).unwrap()
}

async fn assert_nothing_sent(device: &mut DuplexStream) {
    let mut byte = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_millis(50), device.read(&mut byte)).await;
    assert!(read.is_err(), "unexpected bytes on the wire");
}

#[tokio::test]
async fn test_literal_commands() {
    let (mut channel, mut device) = channel();

    channel.send_ping().await.unwrap();
    channel.send_pong().await.unwrap();
    channel.send_connect(APP).await.unwrap();
    channel.send_close(APP).await.unwrap();

    let ping = read_frame(&mut device).await;
    assert_eq!(ping.namespace, NAMESPACE_HEARTBEAT);
    assert_eq!(ping.source_id, DEFAULT_SOURCE_ID);
    assert_eq!(ping.destination_id, DEFAULT_RECEIVER_ID);
    assert_eq!(ping.payload, Payload::Utf8(r#"{"type":"PING"}"#.to_string()));

    let pong = read_frame(&mut device).await;
    assert_eq!(pong.payload_utf8(), Some(r#"{"type":"PONG"}"#));

    let connect = read_frame(&mut device).await;
    assert_eq!(connect.namespace, NAMESPACE_CONNECTION);
    assert_eq!(connect.destination_id, APP);
    assert_eq!(connect.payload_utf8(), Some(r#"{"type":"CONNECT"}"#));

    let close = read_frame(&mut device).await;
    assert_eq!(close.payload_utf8(), Some(r#"{"type":"CLOSE"}"#));

    assert_eq!(channel.sequencer().peek_receiver_id(), 0);
    assert_eq!(channel.sequencer().peek_media_id(), 0);
}

#[tokio::test]
async fn test_auth_challenge_is_binary() {
    let (mut channel, mut device) = channel();
    channel.send_auth_challenge().await.unwrap();

    let auth = read_frame(&mut device).await;
    assert_eq!(auth.namespace, NAMESPACE_DEVICE_AUTH);
    assert_eq!(auth.destination_id, DEFAULT_RECEIVER_ID);
    assert_eq!(auth.payload, Payload::Binary(vec![0x0a, 0x00]));
}

#[tokio::test]
async fn test_receiver_and_media_counters_are_separate() {
    let (mut channel, mut device) = channel();

    channel.request_receiver_status().await.unwrap();
    channel.launch_app().await.unwrap();
    channel.request_media_status(APP).await.unwrap();
    channel.request_receiver_status().await.unwrap();

    let status = read_frame(&mut device).await;
    assert_eq!(status.namespace, NAMESPACE_RECEIVER);
    assert_eq!(
        status.payload_utf8(),
        Some(r#"{"type":"GET_STATUS","requestId":0}"#)
    );

    let launch = payload_json(&read_frame(&mut device).await);
    assert_eq!(launch["type"], "LAUNCH");
    assert_eq!(launch["appId"], "CC1AD845");
    assert_eq!(launch["requestId"], 1);

    let media_status = read_frame(&mut device).await;
    assert_eq!(media_status.namespace, NAMESPACE_MEDIA);
    assert_eq!(media_status.destination_id, APP);
    assert_eq!(payload_json(&media_status)["requestId"], 0);

    let status = payload_json(&read_frame(&mut device).await);
    assert_eq!(status["requestId"], 2);

    assert_eq!(channel.sequencer().peek_receiver_id(), 3);
    assert_eq!(channel.sequencer().peek_media_id(), 1);
}

#[tokio::test]
async fn test_load_music_with_metadata() {
    let (mut channel, mut device) = channel();
    let meta = MediaMetadata::with_title("Song").artist("Band");

    channel
        .load_media(APP, 8010, "audio/mpeg", Some(&meta))
        .await
        .unwrap();

    let load = read_frame(&mut device).await;
    let text = load.payload_utf8().unwrap();
    assert!(text.contains(r#""metadataType":3"#));
    assert!(text.contains(r#""title":"Song""#));
    assert!(text.contains(r#""artist":"Band""#));
    assert!(text.contains(r#""contentId":"http://192.168.1.20:8010/stream""#));

    let body = payload_json(&load);
    assert_eq!(body["type"], "LOAD");
    assert_eq!(body["autoplay"], false);
    assert_eq!(body["requestId"], 0);
}

#[tokio::test]
async fn test_load_video_without_metadata() {
    let (mut channel, mut device) = channel();
    channel.load_media(APP, 8010, "video/mp4", None).await.unwrap();

    let text = read_frame(&mut device).await.payload_utf8().unwrap().to_string();
    assert!(!text.contains(r#""metadata""#));
    assert!(text.contains(r#""streamType":"LIVE""#));
    assert!(text.contains(r#""contentType":"video/mp4""#));
}

#[tokio::test]
async fn test_playback_controls() {
    let (mut channel, mut device) = channel();

    channel.play(APP, 12).await.unwrap();
    channel.pause(APP, 12).await.unwrap();
    channel.stop(APP, 12).await.unwrap();

    for (expected, request_id) in [("PLAY", 0), ("PAUSE", 1), ("STOP", 2)] {
        let body = payload_json(&read_frame(&mut device).await);
        assert_eq!(body["type"], expected);
        assert_eq!(body["mediaSessionId"], 12);
        assert_eq!(body["requestId"], request_id);
    }
}

#[tokio::test]
async fn test_set_volume_range() {
    let (mut channel, mut device) = channel();

    channel.set_volume(APP, 3, -0.1, false).await.unwrap();
    channel.set_volume(APP, 3, 1.5, false).await.unwrap();
    assert_nothing_sent(&mut device).await;
    assert_eq!(channel.sequencer().peek_media_id(), 0);

    channel.set_volume(APP, 3, 0.5, true).await.unwrap();
    let volume = read_frame(&mut device).await;
    let text = volume.payload_utf8().unwrap();
    assert!(text.contains(r#""level":0.5"#));
    assert!(text.contains(r#""muted":true"#));
    assert_eq!(payload_json(&volume)["requestId"], 0);
}

#[tokio::test]
async fn test_seek_passes_time_through() {
    let (mut channel, mut device) = channel();

    channel.seek(APP, 9, "42.250").await.unwrap();
    let seek = read_frame(&mut device).await;
    assert!(seek.payload_utf8().unwrap().contains(r#""currentTime":42.250,"#));

    let result = channel.seek(APP, 9, "not a number").await;
    assert!(matches!(result, Err(CastError::Json(_))));
    assert_nothing_sent(&mut device).await;
    assert_eq!(channel.sequencer().peek_media_id(), 1);
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_play_without_media_session_panics() {
    let (mut channel, _device) = channel();
    let _ = channel.play(APP, 0).await;
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_seek_without_media_session_panics() {
    let (mut channel, _device) = channel();
    let _ = channel.seek(APP, 0, "1.0").await;
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_pause_without_media_session_panics() {
    let (mut channel, _device) = channel();
    let _ = channel.pause(APP, 0).await;
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_stop_without_media_session_panics() {
    let (mut channel, _device) = channel();
    let _ = channel.stop(APP, 0).await;
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_set_volume_without_media_session_panics() {
    let (mut channel, _device) = channel();
    let _ = channel.set_volume(APP, 0, 0.5, false).await;
}

#[tokio::test]
#[should_panic(expected = "media session")]
async fn test_out_of_range_volume_still_checks_media_session() {
    let (mut channel, _device) = channel();
    let _ = channel.set_volume(APP, 0, 1.5, false).await;
}

#[tokio::test]
async fn test_receive_message_resumes_partial_frame() {
    let (mut channel, mut device) = channel();
    let ping = Envelope::new(
        NAMESPACE_HEARTBEAT,
        DEFAULT_RECEIVER_ID,
        DEFAULT_SOURCE_ID,
        Payload::Utf8(r#"{"type":"PING"}"#.to_string()),
    );
    let frame = encode_frame(&ping).unwrap();
    let (first, rest) = frame.split_at(6);

    device.write_all(first).await.unwrap();
    let received = channel
        .receive_message(Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(received, None);

    device.write_all(rest).await.unwrap();
    let received = channel
        .receive_message(Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(received, Some(ping));
}

#[tokio::test]
async fn test_receive_message_reads_back_to_back_frames() {
    let (mut channel, mut device) = channel();
    let status = Envelope::new(
        NAMESPACE_RECEIVER,
        DEFAULT_RECEIVER_ID,
        DEFAULT_SOURCE_ID,
        Payload::Utf8(r#"{"type":"RECEIVER_STATUS","requestId":0}"#.to_string()),
    );
    let pong = Envelope::new(
        NAMESPACE_HEARTBEAT,
        DEFAULT_RECEIVER_ID,
        DEFAULT_SOURCE_ID,
        Payload::Utf8(r#"{"type":"PONG"}"#.to_string()),
    );

    let mut bytes = encode_frame(&status).unwrap();
    bytes.extend(encode_frame(&pong).unwrap());
    device.write_all(&bytes).await.unwrap();

    let wait = Duration::from_secs(1);
    assert_eq!(channel.receive_message(wait).await.unwrap(), Some(status));
    assert_eq!(channel.receive_message(wait).await.unwrap(), Some(pong));
    assert_eq!(
        channel
            .receive_message(Duration::from_millis(20))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_receive_reports_timeout() {
    let (mut channel, _device) = channel();
    let mut buf = [0u8; 16];

    let outcome = channel
        .receive(&mut buf, Duration::from_millis(20))
        .await
        .unwrap();
    assert!(outcome.timed_out);
    assert_eq!(outcome.bytes_read, 0);
}

#[tokio::test]
async fn test_peer_close_and_write_failure() {
    let (mut channel, device) = channel();
    drop(device);

    let mut buf = [0u8; 4];
    let result = channel.receive(&mut buf, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(CastError::ConnectionClosed)));

    let result = channel.send_ping().await;
    assert!(matches!(result, Err(CastError::Io(_))));
}

#[tokio::test]
async fn test_disconnect_twice() {
    let (mut channel, _device) = channel();

    channel.disconnect().await;
    channel.disconnect().await;
    assert!(!channel.is_connected());

    let result = channel.send_ping().await;
    assert!(matches!(result, Err(CastError::NotConnected)));
}

#[tokio::test]
async fn test_independent_channels_keep_own_counters() {
    let (mut first, _first_device) = channel();
    let (mut second, _second_device) = channel();

    first.request_receiver_status().await.unwrap();
    first.request_receiver_status().await.unwrap();
    second.request_receiver_status().await.unwrap();

    assert_eq!(first.sequencer().peek_receiver_id(), 2);
    assert_eq!(second.sequencer().peek_receiver_id(), 1);
}
