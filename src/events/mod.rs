//! # Events Module
//!
//! Event-driven progress reporting for long-running collection work.
//!
//! ## Design
//! The core library emits events through channels, allowing any front
//! end (the CLI progress bar, a review UI) to subscribe and display
//! progress without the engine knowing who is listening.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("Fingerprinted {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! builder.build_collection_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
