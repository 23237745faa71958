use std::sync::{Arc, Mutex};

use crate::instrument::{ScpiTransport, TransportError};

/// Transport double that records every command and answers each query with
/// one canned reply.
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<String>>>,
    reply: String,
}

impl RecordingTransport {
    pub fn new(reply: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            RecordingTransport {
                log: log.clone(),
                reply: reply.to_string(),
            },
            log,
        )
    }
}

#[async_trait::async_trait]
impl ScpiTransport for RecordingTransport {
    async fn write(&mut self, command: &str) -> Result<(), TransportError> {
        self.log.lock().unwrap().push(command.to_string());
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.log.lock().unwrap().push(command.to_string());
        Ok(self.reply.clone())
    }
}
