//! Reload listener lifecycle.
//!
//! [`ReloadListener`] is an explicitly constructed component. The host's
//! plugin hooks call [`ReloadListener::start`] on load and
//! [`ReloadListener::stop`] on unload; nothing here is process-global.
//!
//! The socket is bound synchronously with `std::net` so a bind failure is
//! reported from `start()` itself, then handed to the supplied tokio runtime
//! where axum serves it with one task per connection.

mod routes;

use crate::dispatcher::TickDispatcher;
use crate::domain::config::ReloadConfig;
use crate::domain::error::ReloadError;
use crate::domain::state::ListenerState;
use crate::handoff::{self, HandoffReceiver, HandoffSender};
use crate::ports::{RefreshAction, SessionRegistry, TickScheduler};
use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A running server task and the means to stop it.
struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    /// Fires once the serve future, and with it the socket, has been dropped.
    exited_rx: Receiver<()>,
    task: JoinHandle<()>,
}

/// Signals `exited_rx` when the server task ends, whether it returns,
/// panics or is aborted.
struct ExitSignal(SyncSender<()>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

/// HTTP listener feeding the hand-off queue.
pub struct ReloadListener {
    config: ReloadConfig,
    runtime: Handle,
    state: ListenerState,
    queue: HandoffSender,
    /// Consumer half, moved into the dispatcher on the first successful start.
    receiver: Option<HandoffReceiver>,
    server: Option<ServerHandle>,
}

impl ReloadListener {
    /// Create a stopped listener that will serve on `runtime`.
    pub fn new(config: ReloadConfig, runtime: Handle) -> Result<Self, ReloadError> {
        config.validate()?;

        let (queue, receiver) = handoff::channel(config.queue_warn_threshold);

        Ok(Self {
            config,
            runtime,
            state: ListenerState::Stopped,
            queue,
            receiver: Some(receiver),
            server: None,
        })
    }

    /// Bind the socket, start serving, and register the tick dispatcher.
    ///
    /// The dispatcher is registered with `scheduler` on the first successful
    /// start only. After a `stop()`/`start()` cycle the first dispatcher is
    /// still registered and keeps draining the same queue, so the `registry`
    /// and `refresh` arguments of later starts are dropped.
    ///
    /// A [`ReloadError::Bind`] leaves the listener stopped and registers
    /// nothing; the host keeps running without the feature.
    pub fn start<S, R, A>(
        &mut self,
        scheduler: &mut S,
        registry: R,
        refresh: A,
    ) -> Result<SocketAddr, ReloadError>
    where
        S: TickScheduler + ?Sized,
        R: SessionRegistry + 'static,
        A: RefreshAction<R::Session> + 'static,
    {
        if self.state != ListenerState::Stopped {
            return Err(ReloadError::AlreadyRunning(self.state));
        }
        self.state = ListenerState::Starting;

        let server = match self.spawn_server() {
            Ok(server) => server,
            Err(e) => {
                self.state = ListenerState::Stopped;
                error!(error = %e, "Skin reload listener failed to start");
                return Err(e);
            }
        };
        let local_addr = server.local_addr;
        self.server = Some(server);
        self.state = ListenerState::Listening;
        info!(addr = %local_addr, "Skin reload listener started");

        match self.receiver.take() {
            Some(receiver) => {
                let mut dispatcher = TickDispatcher::new(receiver, registry, refresh);
                scheduler.register_tick_callback(Box::new(move || {
                    dispatcher.on_tick();
                }));
                debug!("Reload dispatcher registered with host scheduler");
            }
            None => debug!("Reload dispatcher already registered"),
        }

        Ok(local_addr)
    }

    /// Stop accepting connections and release the socket.
    ///
    /// Blocks the calling thread until the server task has exited, at most
    /// `stop_timeout`; past that the task is aborted. The port is free again
    /// when this returns, so an immediate `start()` on it succeeds. Queued tokens are kept and still drained by the
    /// dispatcher.
    ///
    /// Called from inside a current-thread runtime the wait would stall the
    /// server itself, so it is skipped; use [`shutdown`](Self::shutdown)
    /// from async code.
    pub fn stop(&mut self) {
        let Some(server) = self.begin_stop() else {
            return;
        };

        if on_current_thread_runtime() {
            debug!("Not waiting for server exit inside a current-thread runtime");
        } else {
            match server.exited_rx.recv_timeout(self.config.stop_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        addr = %server.local_addr,
                        timeout = ?self.config.stop_timeout,
                        "Skin reload server did not exit in time; aborting"
                    );
                    server.task.abort();
                }
            }
        }
        self.finish_stop(server.local_addr);
    }

    /// Like [`stop`](Self::stop), but awaits the server task instead of
    /// blocking the thread.
    pub async fn shutdown(&mut self) {
        let Some(server) = self.begin_stop() else {
            return;
        };

        match tokio::time::timeout(self.config.stop_timeout, server.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Skin reload server task failed"),
            Err(_) => warn!(
                addr = %server.local_addr,
                timeout = ?self.config.stop_timeout,
                "Skin reload server did not exit in time"
            ),
        }
        self.finish_stop(server.local_addr);
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|s| s.local_addr)
    }

    /// Producer half of the queue, for stats and tests.
    pub fn queue(&self) -> &HandoffSender {
        &self.queue
    }

    pub fn config(&self) -> &ReloadConfig {
        &self.config
    }

    fn spawn_server(&self) -> Result<ServerHandle, ReloadError> {
        let addr = self.config.bind_addr();
        let bind_error = |source| ReloadError::Bind { addr, source };

        let std_listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
        std_listener.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = std_listener.local_addr().map_err(bind_error)?;

        let listener = {
            let _guard = self.runtime.enter();
            tokio::net::TcpListener::from_std(std_listener).map_err(bind_error)?
        };

        let router = routes::build_router(self.queue.clone(), &self.config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (exited_tx, exited_rx) = mpsc::sync_channel(1);

        let task = self.runtime.spawn(async move {
            let _exited = ExitSignal(exited_tx);
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            match server.await {
                Ok(()) => debug!(addr = %local_addr, "Skin reload server exited"),
                Err(e) => error!(addr = %local_addr, error = %e, "Skin reload server error"),
            }
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            exited_rx,
            task,
        })
    }

    fn begin_stop(&mut self) -> Option<StoppingServer> {
        let ServerHandle {
            local_addr,
            shutdown_tx,
            exited_rx,
            task,
        } = self.server.take()?;
        self.state = ListenerState::Stopping;
        let _ = shutdown_tx.send(());
        Some(StoppingServer {
            local_addr,
            exited_rx,
            task,
        })
    }

    fn finish_stop(&mut self, addr: SocketAddr) {
        self.state = ListenerState::Stopped;
        info!(
            addr = %addr,
            pending = self.queue.pending(),
            "Skin reload listener stopped"
        );
    }
}

/// A server that has been told to shut down.
struct StoppingServer {
    local_addr: SocketAddr,
    exited_rx: Receiver<()>,
    task: JoinHandle<()>,
}

fn on_current_thread_runtime() -> bool {
    Handle::try_current().is_ok_and(|h| h.runtime_flavor() == RuntimeFlavor::CurrentThread)
}

impl Drop for ReloadListener {
    fn drop(&mut self) {
        self.stop();
    }
}
