//! Front-end state for the photo editor.
//!
//! This module holds everything a front end needs to drive an editing
//! session, independent of how it draws itself.
//!
//! # Architecture
//!
//! - [`state`]: Status machine, completion events and trigger rejections
//! - [`session`]: The coordinator owning selection, prompt and the single result slot
//!
//! # Usage
//!
//! ```ignore
//! use aura_edit_core::ui::Session;
//!
//! let mut session = Session::new(pipeline);
//! session.select_files(files);
//! session.generate()?;
//! if let Some(result) = session.wait().await {
//!     println!("{:?}", result);
//! }
//! ```

mod session;
mod state;

pub use session::Session;
pub use state::{Completion, GenerationStatus, RequestId, TriggerRejected};
