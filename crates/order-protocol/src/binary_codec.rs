//! Binary encoding/decoding for order-entry frames.
//!
//! Every frame is a fixed 24-byte header followed by a body whose length
//! is declared by the header. All integers are little-endian.
//!
//! ```text
//! Header (24 bytes)
//! -----------------
//! [0]      : msg_type (MsgType as u8)
//! [1]      : version  (PROTOCOL_VERSION)
//! [2..4]   : total_size (u16 LE) = 24 + body length
//! [4..8]   : reserved = 0
//! [8..16]  : sequence_number (u64 LE)
//! [16..24] : timestamp_ns (u64 LE)
//!
//! NEW (type=1, 32 bytes):
//!   [0..8]   client_order_id (u64)
//!   [8..16]  price_ticks (i64)
//!   [16..20] qty (i32)
//!   [20..24] instrument_id (u32)
//!   [24]     side (0=Bid, 1=Ask)
//!   [25]     flags (bit0=IOC, bit1=FOK, 0=GTC)
//!   [26..32] reserved
//!
//! CANCEL (type=2, 24 bytes):
//!   [0..8]   exch_order_id (u64)
//!   [8..16]  client_order_id (u64)
//!   [16..20] instrument_id (u32)
//!   [20]     reason_code (u8)
//!   [21..24] reserved
//!
//! ACK (type=3, 40 bytes):
//!   [0..8]   client_order_id (u64)
//!   [8..16]  exch_order_id (u64)
//!   [16]     status (0=accepted)
//!   [17..24] reserved
//!   [24..32] recv_timestamp_ns (u64)
//!   [32..40] ack_timestamp_ns (u64)
//!
//! TRADE (type=4, 40 bytes):
//!   [0..8]   price_ticks (i64)
//!   [8..12]  qty (i32)
//!   [12]     liquidity_flag (u8)
//!   [13..16] reserved
//!   [16..24] resting_order_id (u64)
//!   [24..32] taker_order_id (u64)
//!   [32..36] instrument_id (u32)
//!   [36..40] reserved
//! ```
//!
//! Reserved bytes are written as zero and never inspected on decode.
//!
//! Header and body decoding are separate steps so a stream reader can
//! learn the exact body length before reading it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::wire_types::{
    MsgType, Side, ACK_BODY_LEN, ACK_STATUS_ACCEPTED, CANCEL_BODY_LEN, HEADER_LEN, MAX_FRAME_LEN,
    NEW_BODY_LEN, PROTOCOL_VERSION, TIF_FOK, TIF_IOC, TRADE_BODY_LEN,
};

/// Errors that can arise when encoding/decoding a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Header plus body does not fit the 16-bit `total_size` field.
    #[error("frame of {total} bytes exceeds the maximum of {} bytes", MAX_FRAME_LEN)]
    FrameTooLarge { total: usize },

    /// Header input was not exactly `HEADER_LEN` bytes.
    #[error("malformed header: expected {} bytes, got {len}", HEADER_LEN)]
    MalformedHeader { len: usize },

    /// Body length differs from the fixed layout selected by `msg_type`.
    #[error("body length mismatch for {msg_type}: expected {expected} bytes, got {actual}")]
    BodyLengthMismatch {
        msg_type: MsgType,
        expected: usize,
        actual: usize,
    },

    /// Declared `total_size` is smaller than the header itself.
    #[error("invalid frame size {declared}: smaller than the {} byte header", HEADER_LEN)]
    InvalidFrameSize { declared: u16 },

    /// Declared `total_size` disagrees with the bytes supplied.
    #[error("frame length mismatch: header declares {declared} bytes, got {actual}")]
    FrameLengthMismatch { declared: u16, actual: usize },

    /// Unsupported or mismatched protocol version.
    #[error("protocol version mismatch: got {0}, expected {}", PROTOCOL_VERSION)]
    VersionMismatch(u8),

    /// A typed field holds a value outside its enumeration.
    #[error("invalid {field} value: {value}")]
    InvalidField { field: &'static str, value: u8 },
}

// ============================================================================
// Header
// ============================================================================

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub msg_type: MsgType,
    pub protocol_version: u8,
    /// Header + body bytes.
    pub total_size: u16,
    pub sequence_number: u64,
    pub timestamp_ns: u64,
}

impl FrameHeader {
    /// Number of body bytes that follow this header on the wire.
    pub fn body_len(&self) -> Result<usize, ProtocolError> {
        (self.total_size as usize)
            .checked_sub(HEADER_LEN)
            .ok_or(ProtocolError::InvalidFrameSize {
                declared: self.total_size,
            })
    }

    pub fn check_version(&self) -> Result<(), ProtocolError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch(self.protocol_version));
        }
        Ok(())
    }

    fn put(&self, out: &mut impl BufMut) {
        out.put_u8(self.msg_type.as_u8());
        out.put_u8(self.protocol_version);
        out.put_u16_le(self.total_size);
        out.put_bytes(0, 4); // reserved
        out.put_u64_le(self.sequence_number);
        out.put_u64_le(self.timestamp_ns);
    }
}

/// Decode a header from exactly `HEADER_LEN` bytes.
///
/// `msg_type` is not validated; unknown values come back as
/// [`MsgType::Unrecognized`]. The version is not checked here either, see
/// [`FrameHeader::check_version`].
pub fn decode_header(buf: &[u8]) -> Result<FrameHeader, ProtocolError> {
    if buf.len() != HEADER_LEN {
        return Err(ProtocolError::MalformedHeader { len: buf.len() });
    }

    let mut b = buf;
    let msg_type = MsgType::from_u8(b.get_u8());
    let protocol_version = b.get_u8();
    let total_size = b.get_u16_le();
    b.advance(4);
    let sequence_number = b.get_u64_le();
    let timestamp_ns = b.get_u64_le();

    Ok(FrameHeader {
        msg_type,
        protocol_version,
        total_size,
        sequence_number,
        timestamp_ns,
    })
}

/// Frame an already-encoded body.
///
/// The body is copied verbatim after the header; `total_size` is computed
/// from its length.
pub fn encode_frame(
    msg_type: MsgType,
    body: &[u8],
    sequence_number: u64,
    timestamp_ns: u64,
) -> Result<Bytes, ProtocolError> {
    let total = HEADER_LEN + body.len();
    let total_size =
        u16::try_from(total).map_err(|_| ProtocolError::FrameTooLarge { total })?;

    let header = FrameHeader {
        msg_type,
        protocol_version: PROTOCOL_VERSION,
        total_size,
        sequence_number,
        timestamp_ns,
    };

    let mut out = BytesMut::with_capacity(total);
    header.put(&mut out);
    out.extend_from_slice(body);
    Ok(out.freeze())
}

/// Encode a typed body and frame it under its own message type.
pub fn encode_message(
    body: &Body,
    sequence_number: u64,
    timestamp_ns: u64,
) -> Result<Bytes, ProtocolError> {
    let mut payload = BytesMut::with_capacity(body.msg_type().body_len().unwrap_or(0));
    body.put(&mut payload);
    encode_frame(body.msg_type(), &payload, sequence_number, timestamp_ns)
}

// ============================================================================
// Bodies
// ============================================================================

/// A fixed-size body layout bound to one message type.
pub trait WireBody: Sized {
    const MSG_TYPE: MsgType;
    const LEN: usize;

    /// Append the encoded body (exactly `LEN` bytes) to `out`.
    fn put(&self, out: &mut impl BufMut);

    /// Read the fields from a buffer already checked to be `LEN` bytes.
    fn get(buf: &mut &[u8]) -> Result<Self, ProtocolError>;

    /// Decode from exactly `LEN` bytes.
    fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() != Self::LEN {
            return Err(ProtocolError::BodyLengthMismatch {
                msg_type: Self::MSG_TYPE,
                expected: Self::LEN,
                actual: buf.len(),
            });
        }
        let mut b = buf;
        Self::get(&mut b)
    }

    fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(Self::LEN);
        self.put(&mut out);
        out.freeze()
    }
}

/// New order (client → engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderNewBody {
    pub client_order_id: u64,
    pub price_ticks: i64,
    pub qty: i32,
    pub instrument_id: u32,
    pub side: Side,
    /// Time-in-force bits; `0` is good-till-cancel.
    pub flags: u8,
}

impl OrderNewBody {
    pub fn is_ioc(&self) -> bool {
        self.flags & TIF_IOC != 0
    }

    pub fn is_fok(&self) -> bool {
        self.flags & TIF_FOK != 0
    }
}

impl WireBody for OrderNewBody {
    const MSG_TYPE: MsgType = MsgType::New;
    const LEN: usize = NEW_BODY_LEN;

    fn put(&self, out: &mut impl BufMut) {
        out.put_u64_le(self.client_order_id);
        out.put_i64_le(self.price_ticks);
        out.put_i32_le(self.qty);
        out.put_u32_le(self.instrument_id);
        out.put_u8(self.side.as_u8());
        out.put_u8(self.flags);
        out.put_bytes(0, 6);
    }

    fn get(b: &mut &[u8]) -> Result<Self, ProtocolError> {
        let client_order_id = b.get_u64_le();
        let price_ticks = b.get_i64_le();
        let qty = b.get_i32_le();
        let instrument_id = b.get_u32_le();
        let side_raw = b.get_u8();
        let side = Side::from_u8(side_raw).ok_or(ProtocolError::InvalidField {
            field: "side",
            value: side_raw,
        })?;
        let flags = b.get_u8();

        Ok(OrderNewBody {
            client_order_id,
            price_ticks,
            qty,
            instrument_id,
            side,
            flags,
        })
    }
}

/// Cancel request for an acknowledged order (client → engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancelBody {
    /// Exchange id returned by the NEW's ACK.
    pub exch_order_id: u64,
    /// Fresh client id for this cancel request.
    pub client_order_id: u64,
    pub instrument_id: u32,
    pub reason_code: u8,
}

impl WireBody for OrderCancelBody {
    const MSG_TYPE: MsgType = MsgType::Cancel;
    const LEN: usize = CANCEL_BODY_LEN;

    fn put(&self, out: &mut impl BufMut) {
        out.put_u64_le(self.exch_order_id);
        out.put_u64_le(self.client_order_id);
        out.put_u32_le(self.instrument_id);
        out.put_u8(self.reason_code);
        out.put_bytes(0, 3);
    }

    fn get(b: &mut &[u8]) -> Result<Self, ProtocolError> {
        Ok(OrderCancelBody {
            exch_order_id: b.get_u64_le(),
            client_order_id: b.get_u64_le(),
            instrument_id: b.get_u32_le(),
            reason_code: b.get_u8(),
        })
    }
}

/// Acknowledgement of a NEW or CANCEL (engine → client).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckBody {
    /// Echoes the client id being acknowledged.
    pub client_order_id: u64,
    /// Exchange-assigned id; a CANCEL ack echoes the cancelled order's id.
    pub exch_order_id: u64,
    pub status: u8,
    pub recv_timestamp_ns: u64,
    pub ack_timestamp_ns: u64,
}

impl AckBody {
    pub fn is_accepted(&self) -> bool {
        self.status == ACK_STATUS_ACCEPTED
    }

    /// Engine-side time between ingesting the request and emitting the ack.
    pub fn processing_latency_ns(&self) -> u64 {
        self.ack_timestamp_ns.saturating_sub(self.recv_timestamp_ns)
    }
}

impl WireBody for AckBody {
    const MSG_TYPE: MsgType = MsgType::Ack;
    const LEN: usize = ACK_BODY_LEN;

    fn put(&self, out: &mut impl BufMut) {
        out.put_u64_le(self.client_order_id);
        out.put_u64_le(self.exch_order_id);
        out.put_u8(self.status);
        out.put_bytes(0, 7);
        out.put_u64_le(self.recv_timestamp_ns);
        out.put_u64_le(self.ack_timestamp_ns);
    }

    fn get(b: &mut &[u8]) -> Result<Self, ProtocolError> {
        let client_order_id = b.get_u64_le();
        let exch_order_id = b.get_u64_le();
        let status = b.get_u8();
        b.advance(7);
        let recv_timestamp_ns = b.get_u64_le();
        let ack_timestamp_ns = b.get_u64_le();

        Ok(AckBody {
            client_order_id,
            exch_order_id,
            status,
            recv_timestamp_ns,
            ack_timestamp_ns,
        })
    }
}

/// Fill notification (engine → client).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeBody {
    pub price_ticks: i64,
    pub qty: i32,
    /// Maker/taker indicator.
    pub liquidity_flag: u8,
    /// Maker's exchange order id.
    pub resting_order_id: u64,
    pub taker_order_id: u64,
    pub instrument_id: u32,
}

impl TradeBody {
    pub fn notional_ticks(&self) -> i128 {
        self.price_ticks as i128 * self.qty as i128
    }
}

impl WireBody for TradeBody {
    const MSG_TYPE: MsgType = MsgType::Trade;
    const LEN: usize = TRADE_BODY_LEN;

    fn put(&self, out: &mut impl BufMut) {
        out.put_i64_le(self.price_ticks);
        out.put_i32_le(self.qty);
        out.put_u8(self.liquidity_flag);
        out.put_bytes(0, 3);
        out.put_u64_le(self.resting_order_id);
        out.put_u64_le(self.taker_order_id);
        out.put_u32_le(self.instrument_id);
        out.put_bytes(0, 4);
    }

    fn get(b: &mut &[u8]) -> Result<Self, ProtocolError> {
        let price_ticks = b.get_i64_le();
        let qty = b.get_i32_le();
        let liquidity_flag = b.get_u8();
        b.advance(3);
        let resting_order_id = b.get_u64_le();
        let taker_order_id = b.get_u64_le();
        let instrument_id = b.get_u32_le();

        Ok(TradeBody {
            price_ticks,
            qty,
            liquidity_flag,
            resting_order_id,
            taker_order_id,
            instrument_id,
        })
    }
}

/// A decoded body, selected once by the header's `msg_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    New(OrderNewBody),
    Cancel(OrderCancelBody),
    Ack(AckBody),
    Trade(TradeBody),
    /// Body of a `Reserved` or unrecognized type, left undecoded.
    Opaque { msg_type: MsgType, raw: Bytes },
}

impl Body {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Body::New(_) => MsgType::New,
            Body::Cancel(_) => MsgType::Cancel,
            Body::Ack(_) => MsgType::Ack,
            Body::Trade(_) => MsgType::Trade,
            Body::Opaque { msg_type, .. } => *msg_type,
        }
    }

    fn put(&self, out: &mut impl BufMut) {
        match self {
            Body::New(n) => n.put(out),
            Body::Cancel(c) => c.put(out),
            Body::Ack(a) => a.put(out),
            Body::Trade(t) => t.put(out),
            Body::Opaque { raw, .. } => out.put_slice(raw),
        }
    }
}

/// Decode a body according to `msg_type`.
///
/// Dispatch is keyed on the type only, never on the length: ACK and TRADE
/// bodies are both 40 bytes.
pub fn decode_body(msg_type: MsgType, buf: &[u8]) -> Result<Body, ProtocolError> {
    match msg_type {
        MsgType::New => OrderNewBody::decode(buf).map(Body::New),
        MsgType::Cancel => OrderCancelBody::decode(buf).map(Body::Cancel),
        MsgType::Ack => AckBody::decode(buf).map(Body::Ack),
        MsgType::Trade => TradeBody::decode(buf).map(Body::Trade),
        MsgType::Reserved | MsgType::Unrecognized(_) => Ok(Body::Opaque {
            msg_type,
            raw: Bytes::copy_from_slice(buf),
        }),
    }
}

// ============================================================================
// Whole frames
// ============================================================================

/// One complete frame: header plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Bytes,
}

impl Frame {
    pub fn decode_body(&self) -> Result<Body, ProtocolError> {
        decode_body(self.header.msg_type, &self.body)
    }
}

/// Decode a buffer holding exactly one frame.
///
/// The header's `total_size` must equal the buffer length.
pub fn decode_frame(buf: &[u8]) -> Result<Frame, ProtocolError> {
    if buf.len() < HEADER_LEN {
        return Err(ProtocolError::MalformedHeader { len: buf.len() });
    }

    let header = decode_header(&buf[..HEADER_LEN])?;
    header.body_len()?;
    if header.total_size as usize != buf.len() {
        return Err(ProtocolError::FrameLengthMismatch {
            declared: header.total_size,
            actual: buf.len(),
        });
    }

    Ok(Frame {
        header,
        body: Bytes::copy_from_slice(&buf[HEADER_LEN..]),
    })
}
