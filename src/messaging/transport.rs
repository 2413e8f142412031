use std::net::SocketAddr;
use std::str::FromStr;

use tokio::net::UdpSocket;
use tracing::trace;


/// The transmission primitive: one completed buffer goes out as one datagram.
///  Failure is reported to the caller and nothing else happens - no retry,
///  no buffering at this level.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, to: SocketAddr, buf: &[u8]) -> anyhow::Result<usize>;
}


pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub async fn new() -> anyhow::Result<UdpTransport> {
        let socket = UdpSocket::bind(SocketAddr::from_str("[::]:0")?).await?;
        Ok(UdpTransport { socket })
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    async fn send(&self, to: SocketAddr, buf: &[u8]) -> anyhow::Result<usize> {
        trace!("UDP socket: sending {} bytes to {:?}", buf.len(), to);
        let sent = self.socket.send_to(buf, to).await?;
        Ok(sent)
    }
}
