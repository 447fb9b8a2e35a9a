//! Drives a real `Controller` over a loopback TCP socket: a fake WTP
//! connects, sends HELLO, and the test asserts on the CAPS_REQUEST the
//! controller sends back during registration (§4.5).

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lvapd_core::config::{Config, SecurityConfig, TimeoutConfig};
use lvapd_core::connection::LvapCodec;
use lvapd_core::ids::EtherAddress;
use lvapd_core::resource::{Band, ResourceBlock, TxPolicy};
use lvapd_core::telemetry::Metrics;
use lvapd_core::{codec::Message, Controller};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;

fn pick_free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}

fn test_config(listen: SocketAddr) -> Config {
    Config {
        listen: listen.to_string(),
        protocol_version: 1,
        security: SecurityConfig { max_wtps: 8, ip_filter: Default::default() },
        timeouts: TimeoutConfig { shutdown_drain_secs: 1, ..TimeoutConfig::default() },
        logging: Default::default(),
    }
}

#[tokio::test]
async fn hello_triggers_registration_handshake() {
    let listen = pick_free_addr();
    let config = test_config(listen);
    let metrics = Metrics::new().expect("metrics register");
    let controller = Controller::new(config, metrics);

    let server = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stream = TcpStream::connect(listen).await.expect("connect to controller");
    let mut framed = Framed::new(stream, LvapCodec);

    let wtp = EtherAddress::from_bytes([0x02, 0x00, 0x00, 0x00, 0x00, 0x09]);
    framed
        .send(Message::Hello(lvapd_core::codec::Hello { seq: 0, wtp, period: 30 }))
        .await
        .expect("send HELLO");

    let reply = timeout(Duration::from_secs(2), framed.next())
        .await
        .expect("timed out waiting for a reply")
        .expect("stream closed before a reply arrived")
        .expect("decode error");

    assert!(
        matches!(reply, Message::CapsRequest(_)),
        "expected CAPS_REQUEST as the first registration message, got {reply:?}"
    );

    server.abort();
}

#[tokio::test]
async fn disallowed_source_address_is_rejected() {
    let listen = pick_free_addr();
    let mut config = test_config(listen);
    config.security.ip_filter.mode = lvapd_core::config::IpFilterMode::Allow;
    config.security.ip_filter.networks = vec!["10.0.0.0/8".parse().unwrap()];
    let metrics = Metrics::new().expect("metrics register");
    let controller = Controller::new(config, metrics);

    let server = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Loopback (127.0.0.1) is not in the 10.0.0.0/8 allow-list, so the
    // controller should accept the TCP handshake then close without
    // ever answering.
    let stream = TcpStream::connect(listen).await.expect("connect to controller");
    let mut framed = Framed::new(stream, LvapCodec);
    let wtp = EtherAddress::from_bytes([0x02, 0x00, 0x00, 0x00, 0x00, 0x0a]);
    let _ = framed.send(Message::Hello(lvapd_core::codec::Hello { seq: 0, wtp, period: 30 })).await;

    let result = timeout(Duration::from_millis(500), framed.next()).await;
    match result {
        Ok(Some(Ok(msg))) => panic!("expected no reply for a rejected source address, got {msg:?}"),
        _ => {}
    }

    server.abort();
}

/// A pending xid that never gets its ADD_LVAP_RESPONSE must force the LVAP
/// all the way back to Null: DEL_LVAP emitted, blocks cleared, tenant
/// membership dropped (§5's forced-cleanup contract).
#[tokio::test]
async fn xid_timeout_forces_lvap_cleanup() {
    let listen = pick_free_addr();
    let mut config = test_config(listen);
    config.timeouts.xid_deadline_multiplier = 1;
    config.timeouts.heartbeat_grace_multiplier = 100;
    let metrics = Metrics::new().expect("metrics register");
    let controller = Controller::new(config, metrics.clone());

    let server = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let wtp = EtherAddress::from_bytes([0x02, 0x00, 0x00, 0x00, 0x00, 0x0b]);
    let sta = EtherAddress::from_bytes([0xde, 0xad, 0xbe, 0xef, 0x00, 0x0b]);
    let stream = TcpStream::connect(listen).await.expect("connect to controller");
    let mut framed = Framed::new(stream, LvapCodec);
    framed
        .send(Message::Hello(lvapd_core::codec::Hello { seq: 0, wtp, period: 1 }))
        .await
        .expect("send HELLO");
    // Wait for the registration burst so the connection is on record before
    // assigning a block to it.
    let _ = timeout(Duration::from_millis(500), framed.next()).await;

    let downlink = ResourceBlock::new(wtp, wtp, 6, Band::Band2GHz);
    controller.assign(sta, wtp, downlink, Vec::new()).await.expect("assign");

    // The agent never answers with ADD_LVAP_RESPONSE: let the xid expire and
    // sweep it. Allow a couple of heartbeat periods for the deadline.
    tokio::time::sleep(Duration::from_secs(2)).await;
    controller.sweep_timeouts().await;

    // Drain the registration handshake and the initial ADD_LVAP/SET_PORT
    // until the forced teardown's DEL_LVAP shows up.
    let saw_del_lvap = async {
        loop {
            match framed.next().await {
                Some(Ok(Message::DelLvap(_))) => return true,
                Some(Ok(_)) => continue,
                _ => return false,
            }
        }
    };
    let found = timeout(Duration::from_secs(2), saw_del_lvap).await.expect("timed out waiting for forced DEL_LVAP");
    assert!(found, "expected a forced DEL_LVAP after the xid timed out");
    assert_eq!(metrics.xid_timeouts_total.get(), 1);
    assert_eq!(metrics.lvap_teardowns_total.get(), 1);

    server.abort();
}

/// Mutating the transmission policy on a live LVAP re-emits SET_PORT
/// (§3/§4.3's "mutation triggers a SET_PORT emission").
#[tokio::test]
async fn set_tx_policy_reemits_set_port() {
    let listen = pick_free_addr();
    let config = test_config(listen);
    let metrics = Metrics::new().expect("metrics register");
    let controller = Controller::new(config, metrics);

    let server = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let wtp = EtherAddress::from_bytes([0x02, 0x00, 0x00, 0x00, 0x00, 0x0c]);
    let sta = EtherAddress::from_bytes([0xde, 0xad, 0xbe, 0xef, 0x00, 0x0c]);
    let stream = TcpStream::connect(listen).await.expect("connect to controller");
    let mut framed = Framed::new(stream, LvapCodec);
    framed
        .send(Message::Hello(lvapd_core::codec::Hello { seq: 0, wtp, period: 30 }))
        .await
        .expect("send HELLO");
    // Wait for the registration burst so the connection is on record before
    // assigning a block to it.
    let _ = timeout(Duration::from_millis(500), framed.next()).await;

    let downlink = ResourceBlock::new(wtp, wtp, 6, Band::Band2GHz);
    controller.assign(sta, wtp, downlink, Vec::new()).await.expect("assign");

    let mut policy = TxPolicy::default_for(&downlink, false);
    policy.no_ack = true;
    controller.set_tx_policy(sta, policy).await.expect("set_tx_policy");

    // The first SET_PORT is the default policy emitted by the spawn itself;
    // the mutation's re-emission is the next one with `no_ack` flipped.
    let saw_no_ack_set_port = async {
        loop {
            match framed.next().await {
                Some(Ok(Message::SetPort(set_port))) if set_port.no_ack => return true,
                Some(Ok(_)) => continue,
                _ => return false,
            }
        }
    };
    let found = timeout(Duration::from_secs(2), saw_no_ack_set_port)
        .await
        .expect("timed out waiting for the re-emitted SET_PORT");
    assert!(found, "expected a SET_PORT with no_ack=true after the policy mutation");

    server.abort();
}
