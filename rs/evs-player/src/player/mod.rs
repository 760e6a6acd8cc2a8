//! Players drive a [crate::Decoder] from a frame source and paint the result on a [crate::RenderSink].
//!
//! Neither player spawns tasks. The owner polls [LivePlayer::next] or [RecordedPlayer::next]
//! and calls the control methods between polls.

mod live;
mod recorded;

pub use live::*;
pub use recorded::*;

use crate::{Error, StreamInfo, Timestamp};

/// Something a player reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// A decode session was (re)created.
	Changed(StreamInfo),

	/// A picture was decoded.
	///
	/// Reported even while paused, when the picture is not painted.
	Frame { timestamp: Timestamp },

	EndOfStream,

	Error(Error),
}
