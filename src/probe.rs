//! TCP reachability check for the preview server
//!
//! A successful connect only says *something* is listening; it does not
//! identify the process behind the port.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default connect budget, matching the preview readiness poll
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Returns true if `host:port` accepts a TCP connection within `budget`
pub async fn is_port_open(host: &str, port: u16, budget: Duration) -> bool {
    matches!(
        timeout(budget, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}
