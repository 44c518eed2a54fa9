// crates/order-client/tests/roundtrip.rs
//
// Runs the order-client binary against a scripted engine listening on a
// local socket and checks the console markers it prints.
#![cfg(unix)]

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use order_client::network::{read_frame, write_frame};
use order_protocol::{encode_message, AckBody, Body, MsgType, OrderCancelBody, TradeBody};
use tokio::net::{UnixListener, UnixStream};
use tokio::process::Command;

const PASS_MARKERS: [&str; 5] = [
    "client: connected to server at",
    "client: sent NEW order (cid=42, qty=30, price=101)",
    "NEW ACK: cid=42 exch_oid=1001 status=0 (ACCEPTED)",
    "client: sending CANCEL order for exch_oid=1001",
    "CANCEL ACK: cid=43 exch_oid=1001 status=0 (ACCEPTED)",
];

const DONE_MARKER: &str = "client: workflow completed successfully";

fn socket_path(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "order-client-{}-{}.sock",
        std::process::id(),
        tag
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn ack(client_order_id: u64, exch_order_id: u64, status: u8) -> Body {
    Body::Ack(AckBody {
        client_order_id,
        exch_order_id,
        status,
        recv_timestamp_ns: 1_000,
        ack_timestamp_ns: 1_250,
    })
}

async fn send(stream: &mut UnixStream, body: Body, seq: u64) {
    let bytes = encode_message(&body, seq, 0).unwrap();
    write_frame(stream, &bytes).await.unwrap();
}

async fn expect(stream: &mut UnixStream, msg_type: MsgType) -> Body {
    let frame = read_frame(stream).await.unwrap();
    assert_eq!(frame.header.msg_type, msg_type);
    frame.decode_body().unwrap()
}

async fn run_client(path: &PathBuf) -> Output {
    let child = Command::new(env!("CARGO_BIN_EXE_order-client"))
        .arg("--endpoint")
        .arg(path)
        .arg("--recv-timeout-ms")
        .arg("5000")
        .env_remove("ORDER_CLIENT_ENDPOINT")
        .env_remove("ORDER_CLIENT_RECV_TIMEOUT_MS")
        .env_remove("ORDER_CLIENT_INITIAL_SEQNO")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn order-client");

    tokio::time::timeout(Duration::from_secs(10), child.wait_with_output())
        .await
        .expect("order-client did not exit")
        .expect("failed to collect order-client output")
}

fn dump(output: &Output) -> String {
    format!(
        "status: {:?}\n--- stdout ---\n{}\n--- stderr ---\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[tokio::test]
async fn full_workflow_prints_every_marker() {
    let path = socket_path("ok");
    let listener = UnixListener::bind(&path).unwrap();

    let engine = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let Body::New(order) = expect(&mut stream, MsgType::New).await else {
            unreachable!()
        };
        send(
            &mut stream,
            Body::Trade(TradeBody {
                price_ticks: order.price_ticks,
                qty: 10,
                liquidity_flag: 0,
                resting_order_id: 7,
                taker_order_id: 1001,
                instrument_id: order.instrument_id,
            }),
            1,
        )
        .await;
        send(&mut stream, ack(order.client_order_id, 1001, 0), 2).await;

        let Body::Cancel(cancel) = expect(&mut stream, MsgType::Cancel).await else {
            unreachable!()
        };
        assert_eq!(
            cancel,
            OrderCancelBody {
                exch_order_id: 1001,
                client_order_id: 43,
                instrument_id: 1,
                reason_code: 0,
            }
        );
        send(&mut stream, ack(cancel.client_order_id, 1001, 0), 3).await;
    });

    let output = run_client(&path).await;
    engine.await.unwrap();
    let _ = std::fs::remove_file(&path);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", dump(&output));

    let mut cursor = 0;
    for marker in PASS_MARKERS.iter().chain([&DONE_MARKER]) {
        let at = stdout[cursor..]
            .find(marker)
            .unwrap_or_else(|| panic!("missing {:?}\n{}", marker, dump(&output)));
        cursor += at + marker.len();
    }
    assert!(
        stdout.contains("TRADE: instr=1 px=101 qty=10"),
        "{}",
        dump(&output)
    );
}

#[tokio::test]
async fn engine_hanging_up_fails_the_run() {
    let path = socket_path("eof");
    let listener = UnixListener::bind(&path).unwrap();

    let engine = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        expect(&mut stream, MsgType::New).await;
    });

    let output = run_client(&path).await;
    engine.await.unwrap();
    let _ = std::fs::remove_file(&path);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success(), "{}", dump(&output));
    assert!(stdout.contains("client: sent NEW order"), "{}", dump(&output));
    assert!(!stdout.contains(DONE_MARKER), "{}", dump(&output));
}

#[tokio::test]
async fn rejected_order_is_not_cancelled() {
    let path = socket_path("reject");
    let listener = UnixListener::bind(&path).unwrap();

    let engine = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        expect(&mut stream, MsgType::New).await;
        send(&mut stream, ack(42, 0, 3), 1).await;

        // The client must hang up without sending anything else.
        let mut rest = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut rest)
            .await
            .unwrap();
        assert!(rest.is_empty());
    });

    let output = run_client(&path).await;
    engine.await.unwrap();
    let _ = std::fs::remove_file(&path);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", dump(&output));
    assert!(
        stdout.contains("NEW ACK: cid=42 exch_oid=0 status=3 (REJECTED)"),
        "{}",
        dump(&output)
    );
    assert!(
        stdout.contains("client: NEW order was rejected, cannot cancel"),
        "{}",
        dump(&output)
    );
    assert!(!stdout.contains("CANCEL ACK"), "{}", dump(&output));
}
