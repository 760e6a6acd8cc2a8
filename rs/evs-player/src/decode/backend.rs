use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{Codec, DecodeError, HardwareAcceleration, Presentation, StreamInfo};

/// Everything a backend needs to configure one decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
	pub codec: Codec,

	/// WebCodecs codec string, ex. `avc1.42E01E`.
	pub codec_string: &'static str,

	pub width: u16,
	pub height: u16,
	pub hardware_acceleration: HardwareAcceleration,
	pub optimize_for_latency: bool,
}

/// A frame payload handed to a backend session.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
	pub payload: Bytes,
	pub key: bool,

	/// Echoed back with the decoded picture.
	pub timestamp: Presentation,
}

/// A decode primitive (ex. WebCodecs, VideoToolbox, FFmpeg) able to open sessions.
///
/// Sessions deliver their pictures asynchronously through the [OutputSink] they were opened with.
pub trait DecodeBackend {
	type Picture;
	type Session: DecodeSession;

	fn open(&mut self, config: &SessionConfig, output: OutputSink<Self::Picture>) -> Result<Self::Session, DecodeError>;
}

/// One configured decoder instance.
pub trait DecodeSession {
	/// Queue a chunk for decoding.
	///
	/// An error means the session is unusable and will be torn down.
	fn submit(&mut self, chunk: EncodedChunk) -> Result<(), DecodeError>;

	/// Whether the session was closed underneath us, ex. after an asynchronous error.
	fn is_closed(&self) -> bool;

	fn close(&mut self) -> Result<(), DecodeError>;
}

/// A decoded picture and the presentation it was submitted with.
#[derive(Debug, Clone)]
pub struct Picture<P> {
	pub timestamp: Presentation,
	pub picture: P,
}

/// Something the decoder reports to its owner.
#[derive(Debug, Clone)]
pub enum DecoderEvent<P> {
	/// A new session was opened.
	Changed(StreamInfo),

	Picture(Picture<P>),

	/// The session failed asynchronously.
	Error(DecodeError),
}

pub(super) struct Output<P> {
	pub generation: u64,
	pub event: DecoderEvent<P>,
}

/// The output side of a session, tagged with the session generation.
///
/// Anything sent after the session was replaced or closed is discarded by the decoder.
pub struct OutputSink<P> {
	generation: u64,
	tx: mpsc::UnboundedSender<Output<P>>,
}

impl<P> OutputSink<P> {
	pub(super) fn new(generation: u64, tx: mpsc::UnboundedSender<Output<P>>) -> Self {
		Self { generation, tx }
	}

	/// Deliver a decoded picture.
	///
	/// Returns false if the decoder has been dropped.
	pub fn picture(&self, timestamp: Presentation, picture: P) -> bool {
		self.send(DecoderEvent::Picture(Picture { timestamp, picture }))
	}

	/// Report an asynchronous decode error.
	pub fn error(&self, err: DecodeError) -> bool {
		self.send(DecoderEvent::Error(err))
	}

	pub(super) fn send(&self, event: DecoderEvent<P>) -> bool {
		self.tx
			.send(Output {
				generation: self.generation,
				event,
			})
			.is_ok()
	}
}

impl<P> Clone for OutputSink<P> {
	fn clone(&self) -> Self {
		Self {
			generation: self.generation,
			tx: self.tx.clone(),
		}
	}
}
