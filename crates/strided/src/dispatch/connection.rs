//! Connection handler that serves one client session per connection.
//!
//! Commands on a connection are read, dispatched and answered strictly in
//! order. The session, its gateway and its subscriptions live exactly as long
//! as the connection.

use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::gateway::SimulationGateway;
use crate::health::HealthReporter;
use crate::session::{ConnectionId, Session};
use crate::transport::{ConnectionHandler, ConnectionStream};
use crate::world::ScenarioSource;

use super::DISPATCH_TARGET;
use super::codec::{DaemonMessage, LineReader, ResponseWriter, decode_command, is_blank};
use super::dispatcher::Dispatcher;

/// Serves the remote-control protocol on accepted connections.
pub struct SessionConnectionHandler {
    dispatcher: Arc<Dispatcher>,
    scenarios: Arc<dyn ScenarioSource>,
    reporter: Arc<dyn HealthReporter>,
    next_connection: AtomicU64,
}

impl SessionConnectionHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        scenarios: Arc<dyn ScenarioSource>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            dispatcher,
            scenarios,
            reporter,
            next_connection: AtomicU64::new(1),
        }
    }

    fn serve(&self, session: &mut Session, stream: ConnectionStream) {
        let reader = match stream.try_clone() {
            Ok(reader) => reader,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to split connection stream");
                return;
            }
        };
        let mut lines = LineReader::new(BufReader::new(reader));
        let mut writer = ResponseWriter::new(stream);

        loop {
            let line = match lines.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        connection = %session.id(),
                        "client closed connection"
                    );
                    return;
                }
                Err(error) if error.is_recoverable() => {
                    warn!(target: DISPATCH_TARGET, %error, "rejected request line");
                    if let Err(error) = writer.write_error(&error) {
                        warn!(target: DISPATCH_TARGET, %error, "failed to write error");
                        return;
                    }
                    continue;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                    return;
                }
            };
            if is_blank(&line) {
                continue;
            }

            let message = match decode_command(&line) {
                Ok(command) => DaemonMessage::Response(self.dispatcher.execute(&command, session)),
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "malformed request");
                    DaemonMessage::error(&error)
                }
            };
            if let Err(error) = writer.write_message(&message) {
                warn!(target: DISPATCH_TARGET, %error, "failed to write response");
                return;
            }
        }
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let id = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let gateway = SimulationGateway::new(Arc::clone(&self.scenarios));
        let mut session = Session::new(id, gateway);
        self.reporter.session_opened(id);

        self.serve(&mut session, stream);

        session.close();
        self.reporter.session_closed(id);
    }
}
