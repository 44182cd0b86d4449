//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of workers.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{EmberError, Result};

use super::Connection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// TCP server for EmberKV
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the configured listen address
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            EmberError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to bind {}: {}", config.listen_addr, e),
            ))
        })?;
        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Serve until shutdown is signalled (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.worker_threads * 4);
        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_threads)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<std::io::Result<_>>()?;
        drop(rx);

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    stream.set_nonblocking(false)?;
                    if !self.dispatch(&tx, stream) {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                }
            }
        }

        // Closing the channel lets idle workers exit
        drop(tx);
        for worker in workers {
            let _ = worker.join();
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Queue a stream for the workers; `false` when the loop should stop
    ///
    /// Waits for queue space in short slices so a full queue never hides
    /// a shutdown request.
    fn dispatch(&self, tx: &Sender<TcpStream>, mut stream: TcpStream) -> bool {
        loop {
            match tx.send_timeout(stream, ACCEPT_POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(pending)) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        tracing::debug!("Dropping pending connection during shutdown");
                        return false;
                    }
                    stream = pending;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    tracing::error!("All connection workers have exited");
                    return false;
                }
            }
        }
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> std::io::Result<JoinHandle<()>> {
        let engine = Arc::clone(&self.engine);
        let shutdown = Arc::clone(&self.shutdown);
        let read_timeout = self.config.read_timeout_ms;
        let write_timeout = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("emberkv-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    // Queued clients are not served once shutdown starts
                    if shutdown.load(Ordering::SeqCst) {
                        continue;
                    }
                    let result = Connection::new(stream, Arc::clone(&engine)).and_then(|mut conn| {
                        conn.set_timeouts(read_timeout, write_timeout)?;
                        conn.handle()
                    });
                    if let Err(e) = result {
                        tracing::warn!("Connection error: {}", e);
                    }
                }
            })
    }
}
