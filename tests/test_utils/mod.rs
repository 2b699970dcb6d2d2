//! Helpers shared by the integration tests.
//!
//! Each test binary compiles this module and uses only part of it.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod viewer;

pub use fixtures::{RefusingConnector, tcp_listener, udp_receiver, wait_until};
pub use viewer::{read_plain_lines, read_xml_events};
