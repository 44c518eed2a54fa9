// crates/order-client/src/network.rs

//! Stream plumbing: endpoint parsing, connecting, and exact-length frame I/O.
//!
//! Frames have no delimiter other than the declared `total_size`, so the
//! reader always takes exactly `HEADER_LEN` bytes, decodes the header, then
//! takes exactly the declared body length.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::BytesMut;
use order_protocol::{decode_header, Frame, HEADER_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::error::{Result, SessionError};

/// Where the matching engine listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local-domain stream socket path.
    Unix(PathBuf),
    /// `host:port` TCP address.
    Tcp(String),
}

impl Endpoint {
    /// Parse `tcp://host:port`, `unix://path`, or a bare socket path.
    pub fn parse(s: &str) -> std::result::Result<Self, ConfigError> {
        let s = s.trim();
        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(ConfigError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }

        let path = s.strip_prefix("unix://").unwrap_or(s);
        if path.is_empty() {
            return Err(ConfigError::InvalidEndpoint(s.to_string()));
        }
        Ok(Endpoint::Unix(PathBuf::from(path)))
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

pub async fn connect_tcp(addr: &str) -> io::Result<TcpStream> {
    info!("Connecting to tcp://{}...", addr);
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    info!("Connected successfully");
    Ok(stream)
}

#[cfg(unix)]
pub async fn connect_unix(path: &std::path::Path) -> io::Result<tokio::net::UnixStream> {
    info!("Connecting to {}...", path.display());
    let stream = tokio::net::UnixStream::connect(path).await?;
    info!("Connected successfully");
    Ok(stream)
}

/// Fill `buf` completely or fail.
///
/// A zero-length read before `buf` is full means the peer closed the
/// stream mid-frame, reported with how many bytes did arrive.
async fn read_exact_or_eof<R>(reader: &mut R, buf: &mut [u8], stage: &'static str) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(SessionError::UnexpectedEof {
                stage,
                expected: buf.len(),
                received: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

/// Read one complete frame.
///
/// Rejects a version mismatch or a `total_size` below the header length;
/// the body itself is returned undecoded.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; HEADER_LEN];
    read_exact_or_eof(reader, &mut header_buf, "header").await?;

    let header = decode_header(&header_buf)?;
    header.check_version()?;
    let body_len = header.body_len()?;

    let mut body = BytesMut::zeroed(body_len);
    read_exact_or_eof(reader, &mut body, "body").await?;

    Ok(Frame {
        header,
        body: body.freeze(),
    })
}

/// Write an encoded frame in full and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    debug!(bytes = frame.len(), "frame written");
    Ok(())
}
