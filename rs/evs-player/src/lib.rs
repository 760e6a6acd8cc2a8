//! # evs-player: playback of EVS video streams
//!
//! EVS frames are small envelopes around a single encoded video frame: a fixed 10 byte header
//! naming the codec, resolution and whether the frame is a key unit, followed by the payload.
//!
//! ## API
//!
//! - [Frame]: parse and produce the envelope.
//! - [Decoder]: a decode session state machine on top of a [DecodeBackend], handling codec or
//!   resolution changes, the key frame gate and hardware to software fallback.
//! - [LivePlayer]: plays a [PushSource] as it arrives.
//! - [RecordedPlayer]: plays a recording pulled from a [SegmentQuery], with seeking, frame
//!   stepping in both directions and variable speed.
//!
//! The players own their collaborators and never spawn; call `next().await` to drive them.
//! Decoding, the transport and the rendering surface are provided by the application through
//! the traits in this crate.

mod codec;
mod config;
mod decode;
mod error;
mod frame;
mod overlay;
mod player;
mod source;
mod timestamp;

pub mod history;

pub use codec::*;
pub use config::*;
pub use decode::*;
pub use error::*;
pub use frame::*;
pub use history::PlaybackHistory;
pub use overlay::*;
pub use player::*;
pub use source::*;
pub use timestamp::*;

#[cfg(test)]
mod mock;
