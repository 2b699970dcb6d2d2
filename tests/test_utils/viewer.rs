//! Minimal viewer-side readers for the two wire formats.

use std::{
    io::{BufRead, BufReader, Read},
    net::TcpStream,
    time::Duration,
};

const XML_EVENT_END: &str = "</log4j:event>";

fn with_timeout(stream: &TcpStream) {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
}

/// Read `count` CRLF-terminated lines.
pub fn read_plain_lines(stream: TcpStream, count: usize) -> Vec<String> {
    with_timeout(&stream);
    BufReader::new(stream)
        .lines()
        .take(count)
        .map(|line| line.expect("read plain line"))
        .collect()
}

/// Read `count` XML events, splitting on the closing tag.
pub fn read_xml_events(mut stream: TcpStream, count: usize) -> Vec<String> {
    with_timeout(&stream);
    let mut text = String::new();
    let mut buf = [0u8; 4096];
    while text.matches(XML_EVENT_END).count() < count {
        let n = stream.read(&mut buf).expect("read xml bytes");
        assert!(n > 0, "viewer connection closed early");
        text.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    text.split_inclusive(XML_EVENT_END)
        .take(count)
        .map(str::to_owned)
        .collect()
}
