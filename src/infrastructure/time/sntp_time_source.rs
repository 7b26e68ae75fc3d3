use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;

use crate::application::ports::TimeSource;
use crate::application::services::{RetryPolicy, retry};

const NTP_PACKET_SIZE: usize = 48;
/// Seconds between 1900-01-01 and 1970-01-01.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;
/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_HEADER: u8 = 0x1B;

pub const DEFAULT_NTP_SERVER: &str = "time-a-g.nist.gov:123";

/// Queries an SNTP server over UDP. Exhausted retries yield `None` and the
/// caller falls back to the local clock.
pub struct SntpTimeSource {
    server: String,
    policy: RetryPolicy,
    timeout: Duration,
}

impl SntpTimeSource {
    pub fn new(server: impl Into<String>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            policy,
            timeout,
        }
    }

    async fn query(&self) -> Result<DateTime<Utc>, SntpError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&self.server).await?;

        let mut request = [0u8; NTP_PACKET_SIZE];
        request[0] = CLIENT_HEADER;
        socket.send(&request).await?;

        let mut response = [0u8; NTP_PACKET_SIZE];
        let received = tokio::time::timeout(self.timeout, socket.recv(&mut response))
            .await
            .map_err(|_| SntpError::Timeout)??;

        parse_transmit_timestamp(&response[..received])
    }
}

impl Default for SntpTimeSource {
    fn default() -> Self {
        Self::new(DEFAULT_NTP_SERVER, RetryPolicy::default(), Duration::from_secs(2))
    }
}

#[async_trait::async_trait]
impl TimeSource for SntpTimeSource {
    async fn now(&self) -> Option<DateTime<Utc>> {
        match retry(self.policy, |_| self.query()).await {
            Ok(now) => Some(now),
            Err(e) => {
                tracing::warn!(server = %self.server, error = %e, "NTP query failed");
                None
            }
        }
    }
}

/// Reads the transmit timestamp (bytes 40..48) of an SNTP reply.
pub fn parse_transmit_timestamp(packet: &[u8]) -> Result<DateTime<Utc>, SntpError> {
    if packet.len() < NTP_PACKET_SIZE {
        return Err(SntpError::ShortPacket(packet.len()));
    }

    let seconds = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]);
    let fraction = u32::from_be_bytes([packet[44], packet[45], packet[46], packet[47]]);

    if seconds == 0 {
        return Err(SntpError::Unsynchronized);
    }

    let unix_seconds = i64::from(seconds) - NTP_UNIX_OFFSET;
    let nanos = ((u64::from(fraction) * 1_000_000_000) >> 32) as u32;

    DateTime::from_timestamp(unix_seconds, nanos).ok_or(SntpError::OutOfRange(unix_seconds))
}

#[derive(Debug, thiserror::Error)]
pub enum SntpError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("no reply within timeout")]
    Timeout,
    #[error("reply of {0} bytes is too short")]
    ShortPacket(usize),
    #[error("server reported an unsynchronized clock")]
    Unsynchronized,
    #[error("timestamp {0} out of range")]
    OutOfRange(i64),
}
