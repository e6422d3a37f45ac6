//! Event utils.
//!
//! [`EventSender`] fans every published event out to all live [`EventStream`]s. Each stream owns
//! a bounded buffer, so a stalled consumer loses events instead of blocking the publisher or other
//! consumers.

mod event_sender;
mod event_stream;

pub use event_sender::EventSender;
pub use event_stream::EventStream;
