//! Network Module
//!
//! Serves the line protocol over TCP.
//!
//! The accept loop polls a non-blocking listener and hands each accepted
//! stream to a fixed pool of workers through a bounded `crossbeam`
//! channel. A worker owns one [`Connection`] until the client hangs up.

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
