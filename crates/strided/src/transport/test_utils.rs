//! Connection handlers used by transport tests.

use std::io::{BufRead, BufReader, Write};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{ConnectionHandler, ConnectionStream};

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Echoes every line back until the client hangs up.
pub(crate) struct EchoHandler;

impl ConnectionHandler for EchoHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let Ok(reader) = stream.try_clone() else {
            return;
        };
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else {
                return;
            };
            if writeln!(stream, "{line}").is_err() {
                return;
            }
        }
    }
}
