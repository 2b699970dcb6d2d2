//! Wire-format scenarios as a viewer sees them.

use std::time::{Duration, UNIX_EPOCH};

use log2console::{
    EventFormatter, HostInfo, Log4jXmlFormatter, LogEvent, PlainTextFormatter, Severity,
    SourceLocation, WireFormat, format_event,
};
use rstest::{fixture, rstest};

#[fixture]
fn host() -> HostInfo {
    HostInfo::new("workstation", "alice")
}

fn sequence_of(xml: &str) -> u64 {
    let (_, rest) = xml
        .split_once("<nlog:eventSequenceNumber>")
        .expect("sequence element present");
    let (number, _) = rest.split_once('<').expect("sequence element closed");
    number.parse().expect("numeric sequence")
}

#[rstest]
fn warn_network_event_matches_viewer_layout(host: HostInfo) {
    let event = LogEvent::new(Severity::Warn, "Network", "Connection timeout")
        .with_timestamp(UNIX_EPOCH + Duration::from_millis(1_700_000_000_123));
    let xml = Log4jXmlFormatter::new(&host).format(&event);
    let sequence = sequence_of(&xml);

    let expected = format!(
        "<log4j:event logger=\"Network\" timestamp=\"1700000000123\" level=\"WARN\" thread=\"{}\">\
         <log4j:message><![CDATA[Connection timeout]]></log4j:message>\
         <log4j:properties>\
         <log4j:data name=\"log4net:HostName\" value=\"workstation\"/>\
         <nlog:eventSequenceNumber>{sequence}</nlog:eventSequenceNumber>\
         </log4j:properties></log4j:event>",
        event.thread_id()
    );
    assert_eq!(xml, expected);
}

#[rstest]
fn location_adds_location_info_and_user(host: HostInfo) {
    let event = LogEvent::new(Severity::Error, "Db<Pool>", "lost")
        .with_location(SourceLocation::new("db::pool::acquire", "src/db/pool.rs", 88));
    let xml = format_event(&event, WireFormat::Log4jXml, &host);

    assert!(xml.contains(
        "<log4j:locationInfo class=\"Db&lt;Pool&gt;\" method=\"db::pool::acquire\" file=\"pool.rs\" line=\"88\"/>"
    ));
    assert!(xml.contains("<log4j:data name=\"log4net:UserName\" value=\"alice\"/>"));
}

#[rstest]
fn plain_text_scenario_ends_with_crlf() {
    let event = LogEvent::new(Severity::Error, "FileSystem", "Configuration file not found");
    let line = PlainTextFormatter.format(&event);
    assert!(line.ends_with(" [ERROR] [FileSystem] Configuration file not found\r\n"));
    let (timestamp, _) = line.split_once(" [").expect("timestamp prefix");
    assert_eq!(timestamp.len(), "2024-01-01 00:00:00.000".len());
}
