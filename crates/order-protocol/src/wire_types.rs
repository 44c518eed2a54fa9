//! Low-level wire types and constants.
//!
//! This module defines:
//! - Message type IDs carried in the first header byte.
//! - Protocol versioning.
//! - Fixed header / body sizes.
//! - Order side and time-in-force flag bits.
//!
//! The actual encode/decode logic lives in `binary_codec`.

/// Current protocol version.
///
/// Receivers reject frames carrying any other value.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the frame header on the wire.
pub const HEADER_LEN: usize = 24;

/// Largest frame expressible by the 16-bit `total_size` field.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Body sizes for the fixed-layout messages.
pub const NEW_BODY_LEN: usize = 32;
pub const CANCEL_BODY_LEN: usize = 24;
pub const ACK_BODY_LEN: usize = 40;
pub const TRADE_BODY_LEN: usize = 40;

/// Time-in-force flag: immediate-or-cancel (bit 0). Clear = good-till-cancel.
pub const TIF_IOC: u8 = 0x01;

/// Time-in-force flag: fill-or-kill (bit 1).
pub const TIF_FOK: u8 = 0x02;

/// ACK status for an accepted request. Any other value is a rejection.
pub const ACK_STATUS_ACCEPTED: u8 = 0;

/// Message type carried in byte 0 of every header.
///
/// Decoding never fails on an unknown value: it is preserved in
/// [`MsgType::Unrecognized`] so the receiver can decide what to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MsgType {
    Reserved,
    /// New order (client → engine).
    New,
    /// Cancel an acknowledged order (client → engine).
    Cancel,
    /// Acknowledgement of a NEW or CANCEL (engine → client).
    Ack,
    /// Fill notification (engine → client).
    Trade,
    /// Any type byte outside the known set.
    Unrecognized(u8),
}

impl MsgType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => MsgType::Reserved,
            1 => MsgType::New,
            2 => MsgType::Cancel,
            3 => MsgType::Ack,
            4 => MsgType::Trade,
            other => MsgType::Unrecognized(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            MsgType::Reserved => 0,
            MsgType::New => 1,
            MsgType::Cancel => 2,
            MsgType::Ack => 3,
            MsgType::Trade => 4,
            MsgType::Unrecognized(v) => v,
        }
    }

    /// Fixed body length for the four defined layouts.
    ///
    /// `None` for `Reserved` and unrecognized types, whose bodies are opaque.
    pub fn body_len(self) -> Option<usize> {
        match self {
            MsgType::New => Some(NEW_BODY_LEN),
            MsgType::Cancel => Some(CANCEL_BODY_LEN),
            MsgType::Ack => Some(ACK_BODY_LEN),
            MsgType::Trade => Some(TRADE_BODY_LEN),
            MsgType::Reserved | MsgType::Unrecognized(_) => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MsgType::Reserved => "RESERVED",
            MsgType::New => "NEW",
            MsgType::Cancel => "CANCEL",
            MsgType::Ack => "ACK",
            MsgType::Trade => "TRADE",
            MsgType::Unrecognized(_) => "UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsgType::Unrecognized(v) => write!(f, "UNRECOGNIZED({})", v),
            other => f.write_str(other.name()),
        }
    }
}

/// Order side as carried in `OrderNewBody::side`.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

impl Side {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Side::Bid),
            1 => Some(Side::Ask),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_type_byte_mapping_is_total() {
        for v in 0..=u8::MAX {
            assert_eq!(MsgType::from_u8(v).as_u8(), v);
        }
        assert_eq!(MsgType::from_u8(3), MsgType::Ack);
        assert_eq!(MsgType::from_u8(9), MsgType::Unrecognized(9));
    }

    #[test]
    fn only_defined_layouts_have_body_len() {
        assert_eq!(MsgType::New.body_len(), Some(32));
        assert_eq!(MsgType::Cancel.body_len(), Some(24));
        assert_eq!(MsgType::Ack.body_len(), Some(40));
        assert_eq!(MsgType::Trade.body_len(), Some(40));
        assert_eq!(MsgType::Reserved.body_len(), None);
        assert_eq!(MsgType::Unrecognized(200).body_len(), None);
    }
}
