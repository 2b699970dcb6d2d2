//! Tests for the stream client and its worker.

use std::{
    io::{self, BufRead, BufReader},
    net::TcpListener,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use rstest::{fixture, rstest};

use crate::{
    config::ConsoleConfig,
    level::Severity,
    transport::{CloseHandle, Connection, Connector, Destination},
};

use super::{ConnectionState, StreamClient};

const WAIT: Duration = Duration::from_secs(5);

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn plain_config(port: u16) -> ConsoleConfig {
    ConsoleConfig::new("127.0.0.1", port).with_xml_format(false)
}

/// Message text at the end of a plain-text line.
fn message_of(line: &str) -> &str {
    line.trim_end().rsplit("] ").next().unwrap_or_default()
}

/// In-memory connector recording every payload it accepts.
#[derive(Default)]
struct RecordingConnector {
    attempts: AtomicUsize,
    refuse_first: usize,
    fail_first_send: AtomicBool,
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingConnector {
    fn refusing(count: usize) -> Self {
        Self {
            refuse_first: count,
            ..Self::default()
        }
    }

    fn failing_first_send() -> Self {
        Self {
            fail_first_send: AtomicBool::new(true),
            ..Self::default()
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|line| message_of(line).to_owned())
            .collect()
    }
}

struct RecordingConnection {
    sent: Arc<Mutex<Vec<String>>>,
    fail_next: bool,
}

impl Connection for RecordingConnection {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        if std::mem::take(&mut self.fail_next) {
            return Err(io::ErrorKind::ConnectionReset.into());
        }
        self.sent
            .lock()
            .push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn close_handle(&self) -> io::Result<CloseHandle> {
        Ok(CloseHandle::new(|| {}))
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, _destination: &Destination) -> io::Result<Box<dyn Connection>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.refuse_first {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }
        Ok(Box::new(RecordingConnection {
            sent: Arc::clone(&self.sent),
            fail_next: self.fail_first_send.swap(false, Ordering::SeqCst),
        }))
    }
}

fn client_with(connector: &Arc<RecordingConnector>, config: &ConsoleConfig) -> StreamClient {
    let connector: Arc<dyn Connector> = Arc::clone(connector) as Arc<dyn Connector>;
    StreamClient::with_connector(config, connector)
}

#[rstest]
fn delivers_events_in_order_over_tcp(tcp_listener: TcpListener) {
    let port = tcp_listener.local_addr().expect("listener has address").port();
    let client = StreamClient::with_config(&plain_config(port));
    assert!(client.connect(), "listener is accepting");
    assert!(client.is_connected());

    for i in 0..5 {
        client.log(Severity::Info, "Order", &format!("event {i}"));
    }
    assert!(client.flush(WAIT));

    let (stream, _) = tcp_listener.accept().expect("accept client");
    let reader = BufReader::new(stream);
    let lines: Vec<String> = reader
        .lines()
        .take(5)
        .map(|line| line.expect("read line"))
        .collect();
    let messages: Vec<&str> = lines.iter().map(|line| message_of(line)).collect();
    assert_eq!(
        messages,
        ["event 0", "event 1", "event 2", "event 3", "event 4"]
    );
    assert!(lines[0].contains("[INFO] [Order]"));
}

#[rstest]
fn connect_is_idempotent_while_connected() {
    let connector = Arc::new(RecordingConnector::default());
    let client = client_with(&connector, &plain_config(4445));
    assert!(client.connect());
    assert!(client.connect());
    assert_eq!(connector.attempts(), 1);
}

#[rstest]
fn failed_send_is_retried_after_reconnect() {
    let connector = Arc::new(RecordingConnector::failing_first_send());
    let client = client_with(&connector, &plain_config(4445));
    assert!(client.connect());

    for i in 0..4 {
        client.log(Severity::Warn, "Retry", &format!("event {i}"));
    }

    assert!(wait_until(|| connector.messages().len() == 4));
    let mut delivered = connector.messages();
    delivered.sort();
    assert_eq!(delivered, ["event 0", "event 1", "event 2", "event 3"]);
    assert!(connector.attempts() >= 2, "worker reconnected after failure");
    assert_eq!(client.dropped_events(), 0);
}

#[rstest]
fn connect_without_auto_reconnect_stops_worker() {
    let connector = Arc::new(RecordingConnector::refusing(usize::MAX));
    let config = plain_config(4445).with_auto_reconnect(false);
    let client = client_with(&connector, &config);

    assert!(!client.connect());
    assert!(!client.is_running());
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.log(Severity::Error, "Dropped", "nobody is listening");
    assert_eq!(client.dropped_events(), 1);
    assert_eq!(connector.attempts(), 1);
}

#[rstest]
fn auto_reconnect_keeps_trying_until_viewer_appears() {
    let connector = Arc::new(RecordingConnector::refusing(2));
    let client = client_with(&connector, &plain_config(4445));
    client.set_reconnect_delay(Duration::from_millis(100));

    assert!(!client.connect(), "first attempt is refused");
    assert!(client.is_running());
    client.log(Severity::Info, "Queued", "waits for the viewer");

    assert!(wait_until(|| client.is_connected()));
    assert!(wait_until(|| connector.messages() == ["waits for the viewer"]));
    assert_eq!(connector.attempts(), 3);
}

#[rstest]
fn disconnect_interrupts_reconnect_delay() {
    let connector = Arc::new(RecordingConnector::refusing(usize::MAX));
    let client = client_with(&connector, &plain_config(4445));
    client.set_reconnect_delay(Duration::from_secs(60));
    assert!(!client.connect());

    let start = Instant::now();
    client.disconnect();
    assert!(start.elapsed() < WAIT);
    assert!(!client.is_running());
}

#[rstest]
fn disconnect_is_idempotent_across_threads() {
    let connector = Arc::new(RecordingConnector::default());
    let client = Arc::new(client_with(&connector, &plain_config(4445)));
    assert!(client.connect());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.disconnect())
        })
        .collect();
    for handle in handles {
        handle.join().expect("disconnect should not panic");
    }
    client.disconnect();

    assert!(!client.is_running());
    assert!(!client.is_connected());
    client.log(Severity::Info, "Late", "after disconnect");
    assert_eq!(client.dropped_events(), 1);
}

#[rstest]
fn reconnects_after_disconnect() {
    let connector = Arc::new(RecordingConnector::default());
    let client = client_with(&connector, &plain_config(4445));
    assert!(client.connect());
    client.disconnect();
    assert!(client.connect());
    client.log(Severity::Debug, "Again", "second run");
    assert!(client.flush(WAIT));
    assert_eq!(connector.messages(), ["second run"]);
}

#[rstest]
fn log_before_connect_is_dropped() {
    let connector = Arc::new(RecordingConnector::default());
    let client = client_with(&connector, &plain_config(4445));
    client.log(Severity::Info, "Early", "not started");
    assert_eq!(client.dropped_events(), 1);
    assert_eq!(connector.attempts(), 0);
    assert!(!client.flush(Duration::from_millis(10)));
}

#[rstest]
fn wire_format_switch_applies_to_later_events() {
    let connector = Arc::new(RecordingConnector::default());
    let client = client_with(&connector, &plain_config(4445));
    assert!(client.connect());

    client.log(Severity::Info, "Fmt", "plain");
    assert!(client.flush(WAIT));
    client.set_xml_format(true);
    client.log(Severity::Info, "Fmt", "xml");
    assert!(client.flush(WAIT));

    let sent = connector.sent.lock().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].ends_with("[INFO] [Fmt] plain\r\n"));
    assert!(sent[1].starts_with("<log4j:event logger=\"Fmt\""));
    assert!(sent[1].contains("<![CDATA[xml]]>"));
}

#[rstest]
fn full_queue_drops_newest_events() {
    let connector = Arc::new(RecordingConnector::refusing(usize::MAX));
    let config = plain_config(4445).with_queue_capacity(2);
    let client = client_with(&connector, &config);
    client.set_reconnect_delay(Duration::from_secs(60));
    assert!(!client.connect());

    for i in 0..5 {
        client.log(Severity::Info, "Full", &format!("event {i}"));
    }
    assert_eq!(client.pending_events(), 2);
    assert_eq!(client.dropped_events(), 3);
}

#[rstest]
fn drop_stops_worker() {
    let connector = Arc::new(RecordingConnector::default());
    let client = client_with(&connector, &plain_config(4445));
    assert!(client.connect());
    drop(client);
    assert_eq!(Arc::strong_count(&connector), 1, "worker released connector");
}
