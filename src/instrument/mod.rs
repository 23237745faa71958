use thiserror::Error;

pub mod channel;
pub mod lxi;
pub mod meter;
#[cfg(any(feature = "sim", test))]
pub mod sim;
pub mod supply;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Instrument write '{command}' failed: {source}")]
    Write {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Instrument query '{command}' failed: {source}")]
    Query {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Instrument returned an unparseable reading '{reply}'")]
    BadReading { reply: String },
}

/// Write/query primitives of one physical instrument.
///
/// Implementations hold the connection for the lifetime of the process; the
/// handle is guarded by a mutex further up so instrument exchanges never
/// interleave.
#[async_trait::async_trait]
pub trait ScpiTransport: Send + Sync {
    async fn write(&mut self, command: &str) -> Result<(), TransportError>;

    async fn query(&mut self, command: &str) -> Result<String, TransportError>;
}
