//! Parameter-link engine
//!
//! Binds physical controls to parameters ("learn mode"), dispatches control
//! values to the bound parameters, and persists the bindings by name.
//!
//! All state in this module is owned by the single processing context. The
//! only thing crossing threads is the [`IngestSender`](crate::ingest::IngestSender)
//! handed out by [`LinkEngine::new`].

mod dispatch;
mod error;
mod key;
mod learn;
mod linker;
mod persistence;
mod table;

#[cfg(test)]
mod tests;

pub use dispatch::{dispatch, map_float, map_int, Effect, SLIDER_THRESHOLD, SOURCE_MAX};
pub use error::LinkError;
pub use key::BindingKey;
pub use learn::LearnQueue;
pub use linker::{LinkEngine, Processed};
pub use persistence::{decode_links, encode_links, DEFAULT_LINKS_FILE};
pub use table::LinkTable;
