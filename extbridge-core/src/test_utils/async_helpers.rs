use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Receive the next item or panic after [`RECV_TIMEOUT`]
pub async fn recv_timeout<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    match timeout(RECV_TIMEOUT, rx.recv()).await {
        Ok(Some(item)) => item,
        Ok(None) => panic!("channel closed while waiting"),
        Err(_) => panic!("timed out after {:?}", RECV_TIMEOUT),
    }
}
