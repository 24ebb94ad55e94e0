//! # Events Module
//!
//! Progress reporting for the duplicate pipeline.
//!
//! The pipeline pushes events through a channel; any front end (CLI, GUI)
//! drains the receiver on its own thread. Sending never blocks.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::bounded(256);
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Progress(p) = event {
//!             println!("{} {}/{}", p.phase, p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.scan(&paths, &sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
