//! Codec properties checked over deterministic random inputs.
//!
//! Each test draws its inputs from a seeded ChaCha8 generator, so a
//! failure reproduces exactly on every run.

use order_protocol::wire_types::{ACK_BODY_LEN, TRADE_BODY_LEN};
use order_protocol::{
    decode_body, decode_frame, decode_header, encode_frame, encode_message, AckBody, Body,
    MsgType, OrderCancelBody, OrderNewBody, ProtocolError, Side, TradeBody, WireBody, HEADER_LEN,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ITERATIONS: usize = 500;

// ============================================================================
// GENERATORS
// ============================================================================

fn random_new(rng: &mut ChaCha8Rng) -> OrderNewBody {
    OrderNewBody {
        client_order_id: rng.gen(),
        price_ticks: rng.gen(),
        qty: rng.gen(),
        instrument_id: rng.gen(),
        side: if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask },
        flags: rng.gen_range(0..4),
    }
}

fn random_cancel(rng: &mut ChaCha8Rng) -> OrderCancelBody {
    OrderCancelBody {
        exch_order_id: rng.gen(),
        client_order_id: rng.gen(),
        instrument_id: rng.gen(),
        reason_code: rng.gen(),
    }
}

fn random_ack(rng: &mut ChaCha8Rng) -> AckBody {
    AckBody {
        client_order_id: rng.gen(),
        exch_order_id: rng.gen(),
        status: rng.gen(),
        recv_timestamp_ns: rng.gen(),
        ack_timestamp_ns: rng.gen(),
    }
}

fn random_trade(rng: &mut ChaCha8Rng) -> TradeBody {
    TradeBody {
        price_ticks: rng.gen(),
        qty: rng.gen(),
        liquidity_flag: rng.gen(),
        resting_order_id: rng.gen(),
        taker_order_id: rng.gen(),
        instrument_id: rng.gen(),
    }
}

fn random_body(rng: &mut ChaCha8Rng) -> Body {
    match rng.gen_range(0..4) {
        0 => Body::New(random_new(rng)),
        1 => Body::Cancel(random_cancel(rng)),
        2 => Body::Ack(random_ack(rng)),
        _ => Body::Trade(random_trade(rng)),
    }
}

// ============================================================================
// ROUND TRIP / SIZE INVARIANT
// ============================================================================

#[test]
fn decode_inverts_encode_for_every_body_type() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..ITERATIONS {
        let body = random_body(&mut rng);
        let seq: u64 = rng.gen();
        let ts: u64 = rng.gen();

        let bytes = encode_message(&body, seq, ts).unwrap();
        let frame = decode_frame(&bytes).unwrap();

        assert_eq!(frame.header.msg_type, body.msg_type());
        assert_eq!(frame.header.sequence_number, seq);
        assert_eq!(frame.header.timestamp_ns, ts);
        assert_eq!(frame.decode_body().unwrap(), body);
    }
}

#[test]
fn total_size_matches_header_plus_body() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..ITERATIONS {
        let len = rng.gen_range(0..2048);
        let body: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let msg_type = MsgType::from_u8(rng.gen());

        let bytes = encode_frame(msg_type, &body, 1, 2).unwrap();
        let header = decode_header(&bytes[..HEADER_LEN]).unwrap();

        assert_eq!(header.total_size as usize, HEADER_LEN + len);
        assert_eq!(header.body_len().unwrap(), len);
        assert_eq!(bytes.len(), header.total_size as usize);
        assert_eq!(&bytes[HEADER_LEN..], &body[..]);
    }
}

#[test]
fn encode_rejects_body_beyond_u16_range() {
    let max_body = u16::MAX as usize - HEADER_LEN;
    assert!(encode_frame(MsgType::New, &vec![0u8; max_body], 0, 0).is_ok());

    let err = encode_frame(MsgType::New, &vec![0u8; max_body + 1], 0, 0).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::FrameTooLarge {
            total: u16::MAX as usize + 1
        }
    );
}

// ============================================================================
// TYPE DISPATCH
// ============================================================================

#[test]
fn forty_byte_payload_is_decoded_by_type_not_size() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    assert_eq!(ACK_BODY_LEN, TRADE_BODY_LEN);

    for _ in 0..ITERATIONS {
        let trade = random_trade(&mut rng);
        let raw = trade.to_bytes();

        let as_trade = decode_body(MsgType::Trade, &raw).unwrap();
        let as_ack = decode_body(MsgType::Ack, &raw).unwrap();

        assert_eq!(as_trade, Body::Trade(trade));
        let Body::Ack(ack) = as_ack else {
            panic!("ACK type must decode to an AckBody");
        };

        // Same bytes, different field semantics.
        assert_eq!(ack.client_order_id, trade.price_ticks as u64);
        assert_eq!(ack.exch_order_id as u32 as i32, trade.qty);
        assert_eq!(ack.recv_timestamp_ns, trade.taker_order_id);
    }
}

#[test]
fn reserved_and_unknown_types_stay_opaque() {
    let raw = [1u8, 2, 3, 4, 5];

    for msg_type in [MsgType::Reserved, MsgType::Unrecognized(17)] {
        match decode_body(msg_type, &raw).unwrap() {
            Body::Opaque { msg_type: t, raw: bytes } => {
                assert_eq!(t, msg_type);
                assert_eq!(&bytes[..], &raw[..]);
            }
            other => panic!("expected opaque body, got {:?}", other),
        }
    }
}

#[test]
fn unknown_type_passes_through_header_decode() {
    let bytes = encode_frame(MsgType::Unrecognized(99), &[0xEE; 3], 5, 6).unwrap();
    let header = decode_header(&bytes[..HEADER_LEN]).unwrap();

    assert_eq!(header.msg_type, MsgType::Unrecognized(99));
    assert_eq!(header.body_len().unwrap(), 3);
}

// ============================================================================
// MALFORMED INPUT
// ============================================================================

#[test]
fn short_header_is_malformed() {
    let bytes = encode_frame(MsgType::Ack, &[0u8; 40], 1, 1).unwrap();

    assert_eq!(
        decode_header(&bytes[..23]),
        Err(ProtocolError::MalformedHeader { len: 23 })
    );
    assert_eq!(
        decode_header(&bytes[..25]),
        Err(ProtocolError::MalformedHeader { len: 25 })
    );
}

#[test]
fn body_length_must_match_fixed_layout() {
    let cases = [
        (MsgType::New, 32usize),
        (MsgType::Cancel, 24),
        (MsgType::Ack, 40),
        (MsgType::Trade, 40),
    ];

    for (msg_type, expected) in cases {
        for actual in [0, expected - 1, expected + 1] {
            assert_eq!(
                decode_body(msg_type, &vec![0u8; actual]),
                Err(ProtocolError::BodyLengthMismatch {
                    msg_type,
                    expected,
                    actual
                })
            );
        }
    }
}

#[test]
fn frame_length_must_match_declared_total_size() {
    let mut bytes = encode_frame(MsgType::Cancel, &[0u8; 24], 1, 1).unwrap().to_vec();
    bytes.push(0);

    assert_eq!(
        decode_frame(&bytes),
        Err(ProtocolError::FrameLengthMismatch {
            declared: 48,
            actual: 49
        })
    );
}

#[test]
fn total_size_below_header_is_rejected() {
    let mut bytes = encode_frame(MsgType::Ack, &[], 1, 1).unwrap().to_vec();
    bytes[2..4].copy_from_slice(&10u16.to_le_bytes());

    assert_eq!(
        decode_frame(&bytes),
        Err(ProtocolError::InvalidFrameSize { declared: 10 })
    );
}
