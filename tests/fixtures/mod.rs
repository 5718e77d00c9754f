//! Test fixtures

mod device;

pub use device::{DeviceFixture, TerminalRecord, text_file};
