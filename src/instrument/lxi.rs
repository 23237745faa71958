use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::*;

use crate::instrument::{ScpiTransport, TransportError};

/// Raw-socket SCPI transport for LXI instruments (port 5025 on most units).
///
/// One line out, optionally one line back.
pub struct LxiTransport {
    resource: String,
    stream: BufReader<TcpStream>,
}

impl LxiTransport {
    /// Attempt to open the SCPI socket to the instrument at `resource`
    pub async fn connect(resource: &str) -> Result<Self> {
        let stream = TcpStream::connect(resource)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot open SCPI socket to {resource}: {e}"))?;

        info!("Connected to instrument at {resource}");

        Ok(LxiTransport {
            resource: resource.to_string(),
            stream: BufReader::new(stream),
        })
    }
}

#[async_trait::async_trait]
impl ScpiTransport for LxiTransport {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        debug!(resource = %self.resource, command, "SCPI write");

        let framed = format!("{command}\n");
        self.stream
            .write_all(framed.as_bytes())
            .await
            .map_err(|source| TransportError::Write {
                command: command.to_string(),
                source,
            })
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.write(command).await?;

        let mut reply = String::new();
        self.stream
            .read_line(&mut reply)
            .await
            .map_err(|source| TransportError::Query {
                command: command.to_string(),
                source,
            })?;

        debug!(resource = %self.resource, command, reply = reply.trim(), "SCPI query");
        Ok(reply.trim().to_string())
    }
}
