//! A real listener plus a line-oriented client, for end-to-end scenarios.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use stride_config::{Config, SocketEndpoint};
use stride_protocol::Command;

use crate::bootstrap::{Daemon, StaticConfigLoader, bootstrap_with};
use crate::dispatch::DaemonMessage;
use crate::transport::{ListenerHandle, SocketListener};

use super::reporter::RecordingHealthReporter;

/// Daemon listening on an ephemeral loopback port.
pub struct RunningServer {
    daemon: Daemon,
    listener: Option<ListenerHandle>,
    address: SocketAddr,
    pub reporter: Arc<RecordingHealthReporter>,
}

impl RunningServer {
    #[must_use]
    pub fn start() -> Self {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let loader = StaticConfigLoader::new(Config {
            listen_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            ..Config::default()
        });
        let daemon = bootstrap_with(&loader, reporter.clone()).expect("bootstrap daemon");
        let listener =
            SocketListener::bind(daemon.config().listen_socket()).expect("bind listener");
        let address = listener.local_addr().expect("listener address");
        let handle = listener
            .start(daemon.connection_handler())
            .expect("start listener");
        Self {
            daemon,
            listener: Some(handle),
            address,
            reporter,
        }
    }

    #[must_use]
    pub fn connect(&self) -> SessionClient {
        SessionClient::connect(self.address)
    }

    #[must_use]
    pub fn daemon(&self) -> &Daemon {
        &self.daemon
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

/// One client connection speaking the JSONL framing.
pub struct SessionClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl SessionClient {
    #[must_use]
    pub fn connect(address: SocketAddr) -> Self {
        let writer = TcpStream::connect(address).expect("connect client");
        writer
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let reader = BufReader::new(writer.try_clone().expect("clone client stream"));
        Self { writer, reader }
    }

    pub fn send(&mut self, command: &Command) -> DaemonMessage {
        let line = serde_json::to_string(command).expect("encode command");
        self.send_raw(&line)
    }

    /// Writes `line` verbatim, then reads one message.
    pub fn send_raw(&mut self, line: &str) -> DaemonMessage {
        self.writer.write_all(line.as_bytes()).expect("write line");
        self.writer.write_all(b"\n").expect("write newline");
        self.writer.flush().expect("flush");
        self.read_message()
    }

    pub fn read_message(&mut self) -> DaemonMessage {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read reply");
        assert!(read > 0, "server closed the connection");
        serde_json::from_str(line.trim_end()).expect("decode reply")
    }

    /// Half-closes the connection and waits for the server to hang up.
    pub fn finish(mut self) {
        self.writer
            .shutdown(std::net::Shutdown::Write)
            .expect("shutdown write half");
        let mut rest = String::new();
        let _ = self.reader.read_line(&mut rest);
        assert!(rest.is_empty(), "unexpected trailing output: {rest}");
    }
}
