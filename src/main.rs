//! # mud CLI
//!
//! Command-line interface for the music deduplicator.
//!
//! ## Usage
//! ```bash
//! mud dedup ~/Music --target /var/tmp/dups --no-simulate
//! mud scan && mud build-collection && mud print-duplicates
//! mud forward --instance 1
//! ```

mod cli;

use mud::Result;

fn main() -> Result<()> {
    cli::run()
}
