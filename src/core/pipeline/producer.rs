//! Producer side of the candidate stream.

use super::codec::{CandidateMessage, write_message};
use crate::core::catalog::CatalogBackend;
use crate::core::comparator::DuplicateGrouper;
use crate::error::{PipelineError, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Write every duplicate group of `catalog` to `writer`, then the
/// end-of-stream marker. The marker is written even when there are no
/// groups. Returns the number of groups written.
pub fn fill_candidates<W: Write>(catalog: &dyn CatalogBackend, writer: &mut W) -> Result<usize> {
    let mut groups = 0;
    for group in DuplicateGrouper::new(catalog).duplicate_groups()? {
        debug!(identity = %group.identity, members = group.len(), "Sending candidate group");
        write_message(writer, &CandidateMessage::Group { group }).map_err(PipelineError::Write)?;
        groups += 1;
    }

    write_message(writer, &CandidateMessage::EndOfStream).map_err(PipelineError::Write)?;
    info!(groups, "Candidate stream complete");
    Ok(groups)
}

/// Command that runs the producer for `source_instance` in a child process.
///
/// `exe` is this program's binary. The child writes the stream to its
/// stdout and shares our stderr for logging.
pub fn producer_command(exe: &Path, config: Option<&Path>, source_instance: usize) -> Command {
    let mut command = Command::new(exe);
    if let Some(config) = config {
        command.arg("--config").arg(config);
    }
    command
        .arg("fill-candidates")
        .arg("--instance")
        .arg(source_instance.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    command
}
