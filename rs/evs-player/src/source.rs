//! The collaborators a player is constructed with.
//!
//! None of these are implemented here: the transport, the recording database and the
//! rendering surface belong to the application.

use std::future::Future;

use bytes::Bytes;
use futures::Stream;

use crate::{Overlay, Timestamp};

/// Something a push stream delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
	Start,

	/// One envelope.
	Data(Bytes),

	EndOfStream,

	Error(String),
}

/// A live transport delivering envelopes as they are produced.
pub trait PushSource {
	type Subscription: Stream<Item = PushEvent> + Unpin;

	fn subscribe(&self, stream_id: &str) -> anyhow::Result<Self::Subscription>;

	fn unsubscribe(&self, stream_id: &str);
}

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub timestamp: Timestamp,

	/// The envelope.
	pub data: Bytes,

	pub key: bool,
}

/// Pulls recorded frames in timestamp order.
pub trait SegmentQuery: Send + Sync + 'static {
	/// Return up to `limit` frames starting at `from`.
	///
	/// The response may start at the key unit preceding `from`.
	fn query(
		&self,
		object: &str,
		from: Timestamp,
		limit: usize,
	) -> impl Future<Output = anyhow::Result<Vec<Segment>>> + Send;
}

/// The frame rate of a recorded object, if known.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameRate {
	pub fps: Option<f64>,
}

/// Looks up metadata used to pace a recording.
pub trait MetadataQuery {
	fn object_state(&self, object: &str) -> impl Future<Output = anyhow::Result<FrameRate>> + Send;

	fn recording_info(
		&self,
		object: &str,
		from: Timestamp,
		limit: usize,
	) -> impl Future<Output = anyhow::Result<FrameRate>> + Send;
}

/// The surface decoded pictures are painted on.
pub trait RenderSink<P> {
	fn present(&mut self, picture: P);

	fn overlay(&mut self, overlay: &Overlay);
}
