use crate::config::Config;
use crate::net::handler;
use crate::RcatError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{lookup_host, TcpListener, TcpSocket};

const BACKLOG: u32 = 5;

/// Inbound role: owns the listening socket and fans accepted
/// connections out to independent handler tasks.
pub struct Listener {
    listener: TcpListener,
    config: Arc<Config>,
}

impl Listener {
    /// Bind (target, port) with SO_REUSEADDR and a small backlog.
    pub async fn bind(config: Config) -> crate::Result<Self> {
        let addr = resolve(&config.target, config.port).await?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|e| RcatError::Bind(addr, e))?;
        socket
            .set_reuseaddr(true)
            .map_err(|e| RcatError::Bind(addr, e))?;
        socket.bind(addr).map_err(|e| RcatError::Bind(addr, e))?;
        let listener = socket
            .listen(BACKLOG)
            .map_err(|e| RcatError::Bind(addr, e))?;

        tracing::info!("listening on {}", addr);

        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// The bound address, useful when port 0 was requested.
    pub fn local_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept forever, one task per connection. A handler failure is
    /// logged and scoped to its own connection; the listening socket
    /// is never reachable from handler tasks.
    pub async fn serve(self) -> crate::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            tracing::debug!("connection from {}", peer);

            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = handler::handle(stream, config).await {
                    tracing::warn!("handler error from {}: {}", peer, e);
                }
            });
        }
    }
}

pub(crate) async fn resolve(target: &str, port: u16) -> crate::Result<SocketAddr> {
    let mut addrs = lookup_host((target, port))
        .await
        .map_err(|e| RcatError::Resolve(format!("{target}:{port}: {e}")))?;
    addrs
        .next()
        .ok_or_else(|| RcatError::Resolve(format!("{target}:{port}")))
}
