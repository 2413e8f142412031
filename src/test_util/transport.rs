use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use crate::messaging::transport::Transport;


/// Transport double that records every datagram instead of sending it.
///  `failing()` yields one that additionally reports every send as failed,
///  for exercising the discard-on-error path.
pub struct RecordingTransport {
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    /// Everything sent so far, draining the record.
    pub fn take_sent(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, to: SocketAddr, buf: &[u8]) -> anyhow::Result<usize> {
        self.sent.lock().unwrap().push((to, buf.to_vec()));
        if self.fail {
            return Err(anyhow!("transport failure injected for testing"));
        }
        Ok(buf.len())
    }
}
