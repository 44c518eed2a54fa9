//! Single-line text rendering of decoded frames.
//!
//! Used for console reports and logs. Output format:
//!
//! - Ack:
//!   `<LABEL>: cid=<u64> exch_oid=<u64> status=<u8> (ACCEPTED|REJECTED) recv_ts=<u64> ack_ts=<u64>`
//!
//! - Trade:
//!   `TRADE: instr=<u32> px=<i64> qty=<i32> liq=<u8> maker=<u64> taker=<u64>`
//!
//! - Header:
//!   `<TYPE> v<version> size=<u16> seq=<u64> ts=<u64>`
//!
//! The labels used by the client binary (`NEW ACK`, `CANCEL ACK`) are
//! matched literally by external tooling, so keep the prefix stable.

use crate::binary_codec::{AckBody, FrameHeader, OrderCancelBody, OrderNewBody, TradeBody};
use crate::wire_types::Side;

/// Format an ACK under the given label, e.g. `"NEW ACK"`.
pub fn format_ack(label: &str, a: &AckBody) -> String {
    let verdict = if a.is_accepted() { "ACCEPTED" } else { "REJECTED" };
    format!(
        "{}: cid={} exch_oid={} status={} ({}) recv_ts={} ack_ts={}",
        label,
        a.client_order_id,
        a.exch_order_id,
        a.status,
        verdict,
        a.recv_timestamp_ns,
        a.ack_timestamp_ns
    )
}

pub fn format_trade(t: &TradeBody) -> String {
    format!(
        "TRADE: instr={} px={} qty={} liq={} maker={} taker={}",
        t.instrument_id,
        t.price_ticks,
        t.qty,
        t.liquidity_flag,
        t.resting_order_id,
        t.taker_order_id
    )
}

pub fn format_new(n: &OrderNewBody) -> String {
    let side_char = match n.side {
        Side::Bid => 'B',
        Side::Ask => 'S',
    };
    format!(
        "NEW: cid={} side={} qty={} px={} instr={} flags=0x{:02x}",
        n.client_order_id, side_char, n.qty, n.price_ticks, n.instrument_id, n.flags
    )
}

pub fn format_cancel(c: &OrderCancelBody) -> String {
    format!(
        "CANCEL: cid={} exch_oid={} instr={} reason={}",
        c.client_order_id, c.exch_order_id, c.instrument_id, c.reason_code
    )
}

pub fn format_header(h: &FrameHeader) -> String {
    format!(
        "{} v{} size={} seq={} ts={}",
        h.msg_type, h.protocol_version, h.total_size, h.sequence_number, h.timestamp_ns
    )
}
