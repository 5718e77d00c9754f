//! Line-framed stdio transport.
//!
//! Client messages go to stdout, one per line; every stdin line is an inbound
//! frame. Pipe both ends through a WebSocket bridge to reach the device server.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use termferry_core::{CONNECTED_BANNER, Channel, ChannelError, Transport};

/// Writes each outbound frame as one line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioTransport;

impl Transport for StdioTransport {
    fn send_text(&self, text: String) -> Result<(), ChannelError> {
        let mut stdout = io::stdout().lock();
        write_frame(&mut stdout, &text).map_err(|e| ChannelError::Transport(e.to_string()))
    }
}

fn write_frame<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Write terminal output as-is and flush it
pub fn echo<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Tell the user the device login went out on the channel
pub fn announce_connected<W: Write>(out: &mut W) -> io::Result<()> {
    echo(out, CONNECTED_BANNER)
}

/// Feed stdin lines into `channel` on a dedicated thread until EOF
///
/// # Errors
///
/// Returns an error if the reader thread cannot be spawned.
pub fn spawn_reader(channel: Arc<Channel>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("termferry-stdin".into())
        .spawn(move || pump(io::stdin().lock(), &channel))
}

/// Deliver every line of `input`, then close the channel
fn pump<R: BufRead>(input: R, channel: &Channel) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                channel.deliver(line);
            }
            Err(e) => {
                tracing::error!("stdin read failed: {}", e);
                channel.deliver_error(ChannelError::Transport(e.to_string()));
                break;
            }
        }
    }
    tracing::debug!("inbound stream ended");
    channel.close();
}
