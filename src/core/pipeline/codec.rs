//! Candidate stream wire format: one JSON message per line.

use crate::core::comparator::DuplicateGroup;
use crate::error::PipelineError;
use crossbeam_channel::{Receiver, bounded};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::thread::{self, JoinHandle};

/// One message on the candidate stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateMessage {
    /// A duplicate group from the source instance
    Group { group: DuplicateGroup },
    /// No more groups follow; always the last message
    EndOfStream,
}

/// Write one message and flush it
pub fn write_message<W: Write>(writer: &mut W, message: &CandidateMessage) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Parse one line of the stream
pub fn decode_message(line: &str) -> Result<CandidateMessage, PipelineError> {
    serde_json::from_str(line).map_err(|e| PipelineError::Protocol(e.to_string()))
}

/// Parse `reader` on a background thread into a queue of `capacity` messages.
///
/// The thread stops after the end-of-stream marker, after the first
/// error, or when the receiver is dropped. If the input ends without the
/// marker, the channel disconnects with nothing further sent.
pub fn spawn_reader<R>(
    reader: R,
    capacity: usize,
) -> (Receiver<Result<CandidateMessage, PipelineError>>, JoinHandle<()>)
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = bounded(capacity);

    let handle = thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let item = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => decode_message(&line),
                Err(e) => Err(PipelineError::Protocol(format!("read failed: {}", e))),
            };
            let last = !matches!(item, Ok(CandidateMessage::Group { .. }));
            if sender.send(item).is_err() || last {
                break;
            }
        }
    });

    (receiver, handle)
}
