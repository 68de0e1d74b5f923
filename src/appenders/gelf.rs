//! GELF appender for Graylog
//!
//! Sends each entry as a GELF 1.1 JSON message over UDP. Payloads are
//! optionally gzip compressed and split into GELF chunks when they exceed
//! a single datagram.

use crate::core::output_format::interpolate;
use crate::core::{Appender, LogEntry, LoggerError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Payload bytes per chunk; fits a WAN datagram with the chunk header
pub const GELF_CHUNK_SIZE: usize = 1420;

/// Most chunks a GELF receiver accepts for one message
pub const GELF_MAX_CHUNKS: usize = 128;

const GELF_CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];

/// GELF over UDP appender
///
/// # Example
///
/// ```no_run
/// use request_logger::appenders::GelfAppender;
/// use request_logger::prelude::*;
///
/// let appender = GelfAppender::new("127.0.0.1:12201").expect("Failed to open UDP socket");
///
/// let mut logger = BufferedLogger::builder().appender(appender).build();
/// logger.info("Sent to Graylog", LogContext::new());
/// logger.flush_buffer(true);
/// ```
pub struct GelfAppender {
    socket: UdpSocket,
    target: SocketAddr,
    host: String,
    compress: bool,
}

impl GelfAppender {
    /// Create an appender sending to `addr`
    ///
    /// # Errors
    ///
    /// Returns error if the address does not resolve or no local socket can be bound
    pub fn new(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let address = addr.to_string();
        let target = addr
            .to_socket_addrs()
            .map_err(|e| LoggerError::io_operation("resolve graylog address", address.clone(), e))?
            .next()
            .ok_or_else(|| LoggerError::config("graylog", format!("No address for '{}'", address)))?;

        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| LoggerError::io_operation("bind udp socket", bind_addr, e))?;

        Ok(Self {
            socket,
            target,
            host: default_host(),
            compress: true,
        })
    }

    /// Host name reported in every message
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Enable or disable gzip compression
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Build the GELF message for `entry`
    pub fn message(&self, entry: &LogEntry) -> serde_json::Value {
        let mut gelf = serde_json::Map::new();

        gelf.insert("version".to_string(), "1.1".into());
        gelf.insert("host".to_string(), self.host.as_str().into());
        gelf.insert(
            "short_message".to_string(),
            interpolate(&entry.message, &entry.context).into(),
        );
        gelf.insert(
            "timestamp".to_string(),
            serde_json::json!(entry.timestamp.timestamp_millis() as f64 / 1000.0),
        );
        gelf.insert("level".to_string(), entry.level.syslog_severity().into());
        gelf.insert("_level_name".to_string(), entry.level.to_str().into());

        for (key, value) in entry.context.iter() {
            // `_id` is reserved by GELF
            let field = if key == "id" {
                "_ctxt_id".to_string()
            } else {
                format!("_{}", key)
            };
            gelf.insert(field, value.to_json_value());
        }

        serde_json::Value::Object(gelf)
    }

    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(&self.message(entry))?;
        if !self.compress {
            return Ok(payload);
        }

        let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2), Compression::default());
        encoder
            .write_all(&payload)
            .and_then(|_| encoder.finish())
            .map_err(|e| LoggerError::io_operation("compress gelf message", "gzip failed", e))
    }
}

fn default_host() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Split `payload` into GELF chunked datagrams
///
/// Payloads that fit one datagram are returned unchanged. Each chunk is
/// prefixed with the magic bytes, an 8 byte message id, its sequence number
/// and the chunk count.
pub fn encode_chunks(payload: &[u8]) -> Result<Vec<Vec<u8>>> {
    if payload.len() <= GELF_CHUNK_SIZE {
        return Ok(vec![payload.to_vec()]);
    }

    let count = payload.len().div_ceil(GELF_CHUNK_SIZE);
    if count > GELF_MAX_CHUNKS {
        return Err(LoggerError::writer(format!(
            "GELF message needs {} chunks, at most {} are allowed",
            count, GELF_MAX_CHUNKS
        )));
    }

    let message_id: [u8; 8] = rand::random();

    Ok(payload
        .chunks(GELF_CHUNK_SIZE)
        .enumerate()
        .map(|(sequence, data)| {
            let mut chunk = Vec::with_capacity(12 + data.len());
            chunk.extend_from_slice(&GELF_CHUNK_MAGIC);
            chunk.extend_from_slice(&message_id);
            chunk.push(sequence as u8);
            chunk.push(count as u8);
            chunk.extend_from_slice(data);
            chunk
        })
        .collect())
}

impl Appender for GelfAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let payload = self.encode(entry)?;

        for datagram in encode_chunks(&payload)? {
            self.socket
                .send_to(&datagram, self.target)
                .map_err(|e| LoggerError::io_operation("send gelf message", self.target.to_string(), e))?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "gelf"
    }
}
