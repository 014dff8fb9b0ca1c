//! Consumer side of the candidate stream.

use super::codec::{CandidateMessage, spawn_reader};
use crate::core::catalog::CatalogBackend;
use crate::error::{PipelineError, Result};
use crate::events::{Event, EventSender, ForwardEvent, null_sender};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::process::{Child, Command};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default queue capacity between reader thread and consumer
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default time to wait for the next message
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Result of forwarding
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForwardReport {
    /// Groups received
    pub groups: usize,
    /// Paths received across all groups
    pub paths_forwarded: usize,
    /// Paths that were new to the target catalog
    pub inserted: usize,
}

/// Receives candidate groups and registers their paths in a target catalog
pub struct CandidateForwarder<'a> {
    target: &'a dyn CatalogBackend,
    source_instance: usize,
    queue_capacity: usize,
    receive_timeout: Duration,
}

impl<'a> CandidateForwarder<'a> {
    /// Forward from `source_instance` into `target`
    pub fn new(target: &'a dyn CatalogBackend, source_instance: usize) -> Self {
        Self {
            target,
            source_instance,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set how long to wait for each message
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Run `producer` and forward everything it sends
    pub fn forward(&self, producer: Command) -> Result<ForwardReport> {
        self.forward_with_events(producer, &null_sender())
    }

    /// [`forward`](Self::forward) with progress events.
    ///
    /// The producer has exited by the time this returns, whether
    /// forwarding succeeded or not.
    pub fn forward_with_events(
        &self,
        mut producer: Command,
        events: &EventSender,
    ) -> Result<ForwardReport> {
        let mut child = producer.spawn().map_err(PipelineError::SpawnFailed)?;
        events.send(Event::Forward(ForwardEvent::ProducerStarted {
            source_instance: self.source_instance,
        }));
        info!(source = self.source_instance, pid = child.id(), "Started candidate producer");

        let Some(stdout) = child.stdout.take() else {
            reap(&mut child);
            return Err(PipelineError::ProducerFailed("producer stdout was not piped".into()).into());
        };

        let (receiver, reader) = spawn_reader(stdout, self.queue_capacity);
        let outcome = self.drain(&receiver, events);

        match outcome {
            Ok(report) => {
                drop(receiver);
                let status = child.wait().map_err(PipelineError::SpawnFailed)?;
                let _ = reader.join();
                if !status.success() {
                    return Err(PipelineError::ProducerFailed(status.to_string()).into());
                }
                Ok(report)
            }
            Err(e) => {
                warn!("Stopping candidate producer: {}", e);
                reap(&mut child);
                drop(receiver);
                let _ = reader.join();
                Err(e)
            }
        }
    }

    /// Drain an in-process stream; the reader is joined unless it stalled
    #[cfg(test)]
    fn forward_stream<R>(&self, stream: R, events: &EventSender) -> Result<ForwardReport>
    where
        R: std::io::Read + Send + 'static,
    {
        let (receiver, reader) = spawn_reader(stream, self.queue_capacity);
        let outcome = self.drain(&receiver, events);
        drop(receiver);
        let stalled = matches!(
            outcome,
            Err(crate::error::MudError::Pipeline(PipelineError::Timeout { .. }))
        );
        if !stalled {
            let _ = reader.join();
        }
        outcome
    }

    fn drain(
        &self,
        receiver: &Receiver<std::result::Result<CandidateMessage, PipelineError>>,
        events: &EventSender,
    ) -> Result<ForwardReport> {
        let mut report = ForwardReport::default();

        loop {
            let message = match receiver.recv_timeout(self.receive_timeout) {
                Ok(message) => message?,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(PipelineError::Timeout {
                        seconds: self.receive_timeout.as_secs(),
                    }
                    .into());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PipelineError::StreamTruncated.into());
                }
            };

            let group = match message {
                CandidateMessage::Group { group } => group,
                CandidateMessage::EndOfStream => break,
            };

            for record in &group.records {
                if self.target.insert(&record.path)? {
                    report.inserted += 1;
                }
                report.paths_forwarded += 1;
            }
            report.groups += 1;

            debug!(identity = %group.identity, paths = group.len(), "Forwarded group");
            events.send(Event::Forward(ForwardEvent::GroupReceived {
                identity: group.identity.get(),
                paths: group.len(),
            }));
        }

        events.send(Event::Forward(ForwardEvent::Completed {
            groups: report.groups,
            paths_forwarded: report.paths_forwarded,
        }));
        info!(
            groups = report.groups,
            paths = report.paths_forwarded,
            inserted = report.inserted,
            "Forwarding complete"
        );
        Ok(report)
    }
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Producer already gone: {}", e);
    }
    if let Err(e) = child.wait() {
        warn!("Could not reap producer: {}", e);
    }
}
