//! Handle to a running protocol server.

use std::net::SocketAddr;

use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Owns the accept task and every connection task of one server run.
///
/// Dropping the handle cancels all tasks without waiting for them; use
/// [`ServerHandle::shutdown`] to cancel and wait.
pub(crate) struct ServerHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    tracker: TaskTracker,
    accept_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        cancel: CancellationToken,
        tracker: TaskTracker,
        accept_task: JoinHandle<()>,
    ) -> Self {
        Self {
            local_addr,
            cancel,
            tracker,
            accept_task: Some(accept_task),
        }
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Cancel the accept loop and all connections, then wait for them to exit.
    pub(crate) async fn shutdown(mut self) {
        self.cancel.cancel();
        self.tracker.close();

        if let Some(accept_task) = self.accept_task.take() {
            if let Err(e) = accept_task.await {
                error!("Accept task for {} ended abnormally: {}", self.local_addr, e);
            }
        }

        let outstanding = self.tracker.len();
        if outstanding > 0 {
            info!("Waiting for {outstanding} connection task(s) to terminate");
        }
        self.tracker.wait().await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
