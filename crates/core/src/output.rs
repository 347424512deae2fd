//! Serialised delivery of process output to the rendering surface.
//!
//! Readers never touch a view. Every decoded line becomes a [`ViewUpdate`]
//! sent over one channel, and the rendering loop is the only consumer, so
//! mutations of the surface are applied one at a time in the order each
//! stream produced them.

use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use log::debug;
use parking_lot::Mutex;

const TAB_WIDTH: usize = 4;

/// A mutation of one named view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Append { view: String, line: String },
    Clear { view: String },
}

impl ViewUpdate {
    pub fn view(&self) -> &str {
        match self {
            ViewUpdate::Append { view, .. } | ViewUpdate::Clear { view } => view,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateSender(Sender<ViewUpdate>);

#[derive(Debug)]
pub struct UpdateReceiver(Receiver<ViewUpdate>);

/// Creates the single queue between output readers and the rendering loop.
pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    let (sender, receiver) = mpsc::channel();
    (UpdateSender(sender), UpdateReceiver(receiver))
}

impl UpdateSender {
    /// Queues an update. Returns false once the receiving side is gone.
    pub fn send(&self, update: ViewUpdate) -> bool {
        self.0.send(update).is_ok()
    }

    pub fn sink(&self, view: impl Into<String>) -> OutputSink {
        OutputSink {
            view: view.into(),
            updates: self.clone(),
        }
    }
}

impl UpdateReceiver {
    /// Applies every queued update without blocking and returns how many there were.
    pub fn drain(&self, mut apply: impl FnMut(ViewUpdate)) -> usize {
        let mut applied = 0;
        loop {
            match self.0.try_recv() {
                Ok(update) => {
                    apply(update);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }
}

/// The destination of one command's output: a view name plus the shared queue.
#[derive(Debug, Clone)]
pub struct OutputSink {
    view: String,
    updates: UpdateSender,
}

impl OutputSink {
    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn write_line(&self, line: impl Into<String>) -> bool {
        self.updates.send(ViewUpdate::Append {
            view: self.view.clone(),
            line: line.into(),
        })
    }

    pub fn clear(&self) -> bool {
        self.updates.send(ViewUpdate::Clear {
            view: self.view.clone(),
        })
    }
}

/// Which pipe a stream was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
    /// stdout and stderr merged by a pseudo terminal
    Combined,
}

/// A readable output stream of a running process.
pub struct OutputStream {
    pub kind: StreamKind,
    pub reader: Box<dyn Read + Send>,
}

impl OutputStream {
    pub fn new(kind: StreamKind, reader: impl Read + Send + 'static) -> Self {
        Self {
            kind,
            reader: Box::new(reader),
        }
    }
}

/// Reads `stream` to its end, forwarding every decoded line to `sink`.
///
/// End of stream and read errors both end the loop quietly. Stderr lines
/// that cannot be delivered are kept in `undelivered`.
pub fn forward_lines(stream: OutputStream, sink: &OutputSink, undelivered: &Mutex<String>) {
    let mut reader = BufReader::new(stream.reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => return,
            Ok(_) => {
                let line = decode_line(&buffer);
                if !sink.write_line(line.clone()) && stream.kind == StreamKind::Stderr {
                    let mut undelivered = undelivered.lock();
                    undelivered.push_str(&line);
                    undelivered.push('\n');
                }
            }
            Err(e) => {
                debug!("{:?} stream for `{}` closed: {}", stream.kind, sink.view(), e);
                return;
            }
        }
    }
}

/// Turns raw bytes of one line into display text.
pub fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let text = String::from_utf8_lossy(raw);

    strip_ansi_codes(&text).replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Removes ANSI CSI and OSC escape sequences and stray carriage returns.
pub fn strip_ansi_codes(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\u{1b}' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    // parameters and intermediates run until a final byte in @..~
                    for next in chars.by_ref() {
                        if ('@'..='~').contains(&next) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\u{7}' {
                            break;
                        }
                        if next == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\r' => {}
            _ => result.push(ch),
        }
    }

    result
}
