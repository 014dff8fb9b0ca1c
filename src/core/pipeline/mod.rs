//! # Pipeline Module
//!
//! Forwards duplicate candidates from one catalog instance to the next.
//!
//! ## Stages
//! 1. **Produce** - a separate process runs the duplicate grouper against
//!    instance `k - 1` and writes every group to its stdout, followed by
//!    an end-of-stream marker
//! 2. **Receive** - a reader thread parses the stream into a bounded queue
//! 3. **Register** - every path in every group is inserted into
//!    instance `k` as a new unresolved file
//!
//! ## Processes
//! The producer is a child process, never a thread, so each process
//! owns exactly one catalog connection. The consumer waits for the
//! producer to exit before it reports completion, and kills it first
//! if the stream stalls or breaks.

mod codec;
mod forwarder;
mod producer;

pub use codec::{CandidateMessage, decode_message, spawn_reader, write_message};
pub use forwarder::{CandidateForwarder, ForwardReport};
pub use producer::{fill_candidates, producer_command};

use crate::error::PipelineError;

/// The instance that feeds `target`.
///
/// `target` must be a configured instance other than the primary.
pub fn source_instance_for(target: usize, configured: usize) -> Result<usize, PipelineError> {
    if target == 0 || target >= configured {
        return Err(PipelineError::InstanceOutOfRange {
            instance: target,
            configured,
        });
    }
    Ok(target - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_previous_instance() {
        assert_eq!(source_instance_for(1, 2).unwrap(), 0);
        assert_eq!(source_instance_for(3, 4).unwrap(), 2);
    }

    #[test]
    fn primary_and_unconfigured_targets_are_rejected() {
        assert!(matches!(
            source_instance_for(0, 2),
            Err(PipelineError::InstanceOutOfRange { instance: 0, .. })
        ));
        assert!(matches!(
            source_instance_for(2, 2),
            Err(PipelineError::InstanceOutOfRange { instance: 2, configured: 2 })
        ));
    }
}
