//! order-protocol
//!
//! Wire-level encoding/decoding for the order-entry protocol.
//!
//! This crate turns fixed-layout message bodies (NEW, CANCEL, ACK, TRADE)
//! into framed bytes and back again. It performs no I/O.
//!
//! - [`wire_types`]   : message type IDs, sizes, constants
//! - [`binary_codec`] : 24-byte header and body layouts
//! - [`text_codec`]   : single-line text rendering for reports / logs

pub mod wire_types;
pub mod binary_codec;
pub mod text_codec;

pub use wire_types::{MsgType, Side, HEADER_LEN, PROTOCOL_VERSION};

pub use binary_codec::{
    AckBody,
    Body,
    Frame,
    FrameHeader,
    OrderCancelBody,
    OrderNewBody,
    ProtocolError,
    TradeBody,
    WireBody,
    decode_body,
    decode_frame,
    decode_header,
    encode_frame,
    encode_message,
};
