// crates/order-client/src/session.rs

//! One-shot order lifecycle over a connected stream.
//!
//! ```text
//! Idle ──submit_new──▶ NewSent ──await_new_ack──▶ Acknowledged(exch_order_id)
//!                                   │                    │
//!                                   └─ status != 0 ─▶ Rejected
//!                                                        │
//!             CancelAcknowledged ◀──await_cancel_ack── CancelSent ◀──submit_cancel
//! ```
//!
//! There is no way back to an earlier state. Any fatal error moves the
//! session to `Failed`.
//!
//! While waiting for the NEW's ACK, TRADE frames are recorded as fills.
//! While waiting for the CANCEL's ACK they are discarded. Frames of any other
//! type are logged and skipped in both waits.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use order_protocol::text_codec::{format_cancel, format_header, format_new, format_trade};
use order_protocol::{
    encode_message, AckBody, Body, Frame, MsgType, OrderCancelBody, OrderNewBody, TradeBody,
    WireBody,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::network::{read_frame, write_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    NewSent,
    Acknowledged { exch_order_id: u64 },
    CancelSent { exch_order_id: u64 },
    CancelAcknowledged { exch_order_id: u64 },
    /// The NEW's ACK carried a non-zero status; nothing left to cancel.
    Rejected { status: u8 },
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::NewSent => write!(f, "NewSent"),
            SessionState::Acknowledged { exch_order_id } => {
                write!(f, "Acknowledged({})", exch_order_id)
            }
            SessionState::CancelSent { exch_order_id } => write!(f, "CancelSent({})", exch_order_id),
            SessionState::CancelAcknowledged { exch_order_id } => {
                write!(f, "CancelAcknowledged({})", exch_order_id)
            }
            SessionState::Rejected { status } => write!(f, "Rejected(status={})", status),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Sequence number of the first frame sent.
    pub initial_seqno: u64,
    /// Deadline for each received frame. `None` blocks indefinitely.
    pub recv_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_seqno: 1,
            recv_timeout: None,
        }
    }
}

/// Caller-supplied part of a CANCEL; the exchange id and instrument come
/// from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelRequest {
    pub client_order_id: u64,
    pub reason_code: u8,
}

/// Outcome of [`OrderSession::run_lifecycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleReport {
    pub new_ack: AckBody,
    /// `None` when the NEW was rejected and no cancel was sent.
    pub cancel_ack: Option<AckBody>,
    pub fills: Vec<TradeBody>,
    pub discarded_trades: u64,
    pub skipped_frames: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckWait {
    New,
    Cancel,
}

pub struct OrderSession<S> {
    stream: S,
    state: SessionState,
    recv_timeout: Option<Duration>,
    next_seqno: u64,
    order: Option<OrderNewBody>,
    fills: Vec<TradeBody>,
    discarded_trades: u64,
    skipped_frames: u64,
}

impl<S> OrderSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, options: SessionOptions) -> Self {
        Self {
            stream,
            state: SessionState::Idle,
            recv_timeout: options.recv_timeout,
            next_seqno: options.initial_seqno,
            order: None,
            fills: Vec::new(),
            discarded_trades: 0,
            skipped_frames: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Exchange id captured from the NEW's ACK, once known.
    pub fn exch_order_id(&self) -> Option<u64> {
        match self.state {
            SessionState::Acknowledged { exch_order_id }
            | SessionState::CancelSent { exch_order_id }
            | SessionState::CancelAcknowledged { exch_order_id } => Some(exch_order_id),
            _ => None,
        }
    }

    /// Fills observed while waiting for the NEW's ACK.
    pub fn fills(&self) -> &[TradeBody] {
        &self.fills
    }

    pub fn discarded_trades(&self) -> u64 {
        self.discarded_trades
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn next_sequence_number(&self) -> u64 {
        self.next_seqno
    }

    /// Idle → NewSent. Returns the sequence number used.
    pub async fn submit_new(&mut self, order: OrderNewBody) -> Result<u64> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("submit NEW"));
        }

        let sent = self.send(&Body::New(order)).await;
        let seq = self.settle(sent)?;
        self.order = Some(order);
        self.state = SessionState::NewSent;
        info!(seq, order = %format_new(&order), "NEW sent");
        Ok(seq)
    }

    /// NewSent → Acknowledged (or Rejected). TRADE frames seen first are
    /// recorded as fills.
    pub async fn await_new_ack(&mut self) -> Result<AckBody> {
        if self.state != SessionState::NewSent {
            return Err(self.invalid("await NEW ACK"));
        }

        let received = self.wait_for_ack(AckWait::New).await;
        let ack = self.settle(received)?;

        if let Some(order) = self.order {
            if ack.client_order_id != order.client_order_id {
                warn!(
                    expected = order.client_order_id,
                    got = ack.client_order_id,
                    "NEW ACK echoes a different client order id"
                );
            }
        }

        if ack.is_accepted() {
            self.state = SessionState::Acknowledged {
                exch_order_id: ack.exch_order_id,
            };
            info!(
                exch_order_id = ack.exch_order_id,
                latency_ns = ack.processing_latency_ns(),
                fills = self.fills.len(),
                "NEW acknowledged"
            );
        } else {
            self.state = SessionState::Rejected { status: ack.status };
            warn!(status = ack.status, "NEW rejected");
        }
        Ok(ack)
    }

    /// Acknowledged → CancelSent. Returns the sequence number used.
    pub async fn submit_cancel(&mut self, request: CancelRequest) -> Result<u64> {
        let SessionState::Acknowledged { exch_order_id } = self.state else {
            return Err(self.invalid("submit CANCEL"));
        };
        let Some(order) = self.order else {
            return Err(self.invalid("submit CANCEL"));
        };

        let cancel = OrderCancelBody {
            exch_order_id,
            client_order_id: request.client_order_id,
            instrument_id: order.instrument_id,
            reason_code: request.reason_code,
        };
        let sent = self.send(&Body::Cancel(cancel)).await;
        let seq = self.settle(sent)?;
        self.state = SessionState::CancelSent { exch_order_id };
        info!(seq, cancel = %format_cancel(&cancel), "CANCEL sent");
        Ok(seq)
    }

    /// CancelSent → CancelAcknowledged. TRADE frames seen first are
    /// discarded.
    pub async fn await_cancel_ack(&mut self) -> Result<AckBody> {
        let SessionState::CancelSent { exch_order_id } = self.state else {
            return Err(self.invalid("await CANCEL ACK"));
        };

        let received = self.wait_for_ack(AckWait::Cancel).await;
        let ack = self.settle(received)?;
        self.state = SessionState::CancelAcknowledged { exch_order_id };
        info!(
            exch_order_id,
            status = ack.status,
            discarded_trades = self.discarded_trades,
            "CANCEL acknowledged"
        );
        Ok(ack)
    }

    /// Drive the whole lifecycle: NEW, its ACK, CANCEL, its ACK.
    ///
    /// Stops after the NEW's ACK if the order was rejected.
    pub async fn run_lifecycle(
        &mut self,
        order: OrderNewBody,
        cancel: CancelRequest,
    ) -> Result<LifecycleReport> {
        self.submit_new(order).await?;
        let new_ack = self.await_new_ack().await?;

        let cancel_ack = if new_ack.is_accepted() {
            self.submit_cancel(cancel).await?;
            Some(self.await_cancel_ack().await?)
        } else {
            None
        };

        Ok(LifecycleReport {
            new_ack,
            cancel_ack,
            fills: self.fills.clone(),
            discarded_trades: self.discarded_trades,
            skipped_frames: self.skipped_frames,
        })
    }

    /// Shut down the write side and release the stream.
    pub async fn close(mut self) -> Result<()> {
        match self.stream.shutdown().await {
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other.map_err(SessionError::from),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    // ------------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------------

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }

    /// Any error reaching this point is fatal to the session.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(state = %self.state, error = %e, "session failed");
            self.state = SessionState::Failed;
        }
        result
    }

    async fn send(&mut self, body: &Body) -> Result<u64> {
        let seq = self.next_seqno;
        let bytes = encode_message(body, seq, now_ns())?;
        write_frame(&mut self.stream, &bytes).await?;
        self.next_seqno += 1;
        Ok(seq)
    }

    async fn recv_frame(&mut self) -> Result<Frame> {
        let frame = match self.recv_timeout {
            Some(limit) => tokio::time::timeout(limit, read_frame(&mut self.stream))
                .await
                .map_err(|_| SessionError::Timeout(limit))??,
            None => read_frame(&mut self.stream).await?,
        };
        debug!(header = %format_header(&frame.header), "frame received");
        Ok(frame)
    }

    async fn wait_for_ack(&mut self, wait: AckWait) -> Result<AckBody> {
        loop {
            let frame = self.recv_frame().await?;

            match frame.header.msg_type {
                MsgType::Ack => return Ok(AckBody::decode(&frame.body)?),
                MsgType::Trade => {
                    let trade = TradeBody::decode(&frame.body)?;
                    match wait {
                        AckWait::New => {
                            info!(fill = %format_trade(&trade), "fill observed");
                            self.fills.push(trade);
                        }
                        AckWait::Cancel => {
                            debug!(fill = %format_trade(&trade), "trade discarded while awaiting CANCEL ACK");
                            self.discarded_trades += 1;
                        }
                    }
                }
                other => {
                    warn!(
                        msg_type = %other,
                        seq = frame.header.sequence_number,
                        "skipping unexpected frame"
                    );
                    self.skipped_frames += 1;
                }
            }
        }
    }
}

/// Wall-clock nanoseconds for the header timestamp. Opaque to the receiver.
fn now_ns() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or_default()
}
