//! In-memory collaborators for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::channel::mpsc;

use crate::*;

pub fn envelope(codec: Codec, width: u16, height: u16, key: bool) -> Bytes {
	Frame {
		codec,
		width,
		height,
		key,
		payload: Bytes::from_static(b"payload"),
	}
	.encode()
}

pub fn ms(millis: u64) -> Timestamp {
	Timestamp::from_millis_unchecked(millis)
}

/// Recorded frames at the given milliseconds, with a key unit every `gop` frames.
pub fn segments(millis: impl IntoIterator<Item = u64>, gop: usize) -> Vec<Segment> {
	millis
		.into_iter()
		.enumerate()
		.map(|(i, millis)| {
			let key = i % gop == 0;
			Segment {
				timestamp: ms(millis),
				data: envelope(Codec::H264, 640, 480, key),
				key,
			}
		})
		.collect()
}

#[derive(Default)]
struct BackendState {
	opened: Vec<SessionConfig>,
	submitted: Vec<EncodedChunk>,
	closed: usize,
	fail_open: bool,
	fail_submit: bool,
	silent: bool,
	sinks: Vec<OutputSink<u64>>,
	flags: Vec<Arc<AtomicBool>>,
}

/// Decodes synchronously: every accepted chunk immediately produces a picture carrying its timestamp in µs.
#[derive(Clone, Default)]
pub struct MockBackend {
	state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
	pub fn opened(&self) -> Vec<SessionConfig> {
		self.state.lock().unwrap().opened.clone()
	}

	pub fn submitted(&self) -> Vec<EncodedChunk> {
		self.state.lock().unwrap().submitted.clone()
	}

	pub fn closed(&self) -> usize {
		self.state.lock().unwrap().closed
	}

	pub fn fail_next_open(&self) {
		self.state.lock().unwrap().fail_open = true;
	}

	pub fn fail_next_submit(&self) {
		self.state.lock().unwrap().fail_submit = true;
	}

	/// Stop producing pictures; a test can deliver them through [Self::sink].
	pub fn silence(&self) {
		self.state.lock().unwrap().silent = true;
	}

	/// Mark every open session as closed, as if the platform tore them down.
	pub fn close_sessions(&self) {
		for flag in &self.state.lock().unwrap().flags {
			flag.store(true, Ordering::SeqCst);
		}
	}

	pub fn sink(&self, index: usize) -> OutputSink<u64> {
		self.state.lock().unwrap().sinks[index].clone()
	}
}

impl DecodeBackend for MockBackend {
	type Picture = u64;
	type Session = MockSession;

	fn open(
		&mut self,
		config: &SessionConfig,
		output: OutputSink<u64>,
	) -> std::result::Result<MockSession, DecodeError> {
		let mut state = self.state.lock().unwrap();
		if std::mem::take(&mut state.fail_open) {
			return Err(DecodeError::Configure("mock".into()));
		}

		let closed = Arc::new(AtomicBool::new(false));
		state.opened.push(config.clone());
		state.sinks.push(output.clone());
		state.flags.push(closed.clone());

		Ok(MockSession {
			state: self.state.clone(),
			output,
			closed,
		})
	}
}

pub struct MockSession {
	state: Arc<Mutex<BackendState>>,
	output: OutputSink<u64>,
	closed: Arc<AtomicBool>,
}

impl DecodeSession for MockSession {
	fn submit(&mut self, chunk: EncodedChunk) -> std::result::Result<(), DecodeError> {
		let mut state = self.state.lock().unwrap();
		if std::mem::take(&mut state.fail_submit) {
			return Err(DecodeError::Submit("mock".into()));
		}

		state.submitted.push(chunk.clone());
		if !state.silent {
			self.output.picture(chunk.timestamp, chunk.timestamp.timestamp().as_micros());
		}

		Ok(())
	}

	fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	fn close(&mut self) -> std::result::Result<(), DecodeError> {
		self.closed.store(true, Ordering::SeqCst);
		self.state.lock().unwrap().closed += 1;
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
	Picture(u64),
	Overlay(Overlay),
}

#[derive(Clone, Default)]
pub struct MockRender {
	rendered: Arc<Mutex<Vec<Rendered>>>,
}

impl MockRender {
	pub fn rendered(&self) -> Vec<Rendered> {
		self.rendered.lock().unwrap().clone()
	}

	pub fn pictures(&self) -> Vec<u64> {
		self.rendered()
			.into_iter()
			.filter_map(|rendered| match rendered {
				Rendered::Picture(picture) => Some(picture),
				Rendered::Overlay(_) => None,
			})
			.collect()
	}

	pub fn overlays(&self) -> Vec<Overlay> {
		self.rendered()
			.into_iter()
			.filter_map(|rendered| match rendered {
				Rendered::Overlay(overlay) => Some(overlay),
				Rendered::Picture(_) => None,
			})
			.collect()
	}
}

impl RenderSink<u64> for MockRender {
	fn present(&mut self, picture: u64) {
		self.rendered.lock().unwrap().push(Rendered::Picture(picture));
	}

	fn overlay(&mut self, overlay: &Overlay) {
		self.rendered.lock().unwrap().push(Rendered::Overlay(overlay.clone()));
	}
}

#[derive(Clone, Default)]
pub struct MockPush {
	streams: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<PushEvent>>>>,
	unsubscribed: Arc<Mutex<Vec<String>>>,
}

impl MockPush {
	pub fn send(&self, stream_id: &str, event: PushEvent) {
		self.streams.lock().unwrap()[stream_id].unbounded_send(event).unwrap();
	}

	/// Close the stream from the source side, without an end of stream event.
	pub fn end(&self, stream_id: &str) {
		self.streams.lock().unwrap().remove(stream_id);
	}

	pub fn unsubscribed(&self) -> Vec<String> {
		self.unsubscribed.lock().unwrap().clone()
	}
}

impl PushSource for MockPush {
	type Subscription = mpsc::UnboundedReceiver<PushEvent>;

	fn subscribe(&self, stream_id: &str) -> anyhow::Result<Self::Subscription> {
		let (tx, rx) = mpsc::unbounded();
		self.streams.lock().unwrap().insert(stream_id.to_string(), tx);
		Ok(rx)
	}

	fn unsubscribe(&self, stream_id: &str) {
		self.unsubscribed.lock().unwrap().push(stream_id.to_string());
	}
}

struct Response {
	delay: Duration,
	result: anyhow::Result<Vec<Segment>>,
}

#[derive(Default)]
struct QueryState {
	responses: VecDeque<Response>,
	calls: Vec<(Timestamp, usize)>,
}

/// Answers queries from a script; an exhausted script answers with nothing.
#[derive(Clone, Default)]
pub struct MockQuery {
	state: Arc<Mutex<QueryState>>,
}

impl MockQuery {
	pub fn respond(&self, segments: Vec<Segment>) {
		self.respond_after(Duration::ZERO, segments);
	}

	pub fn respond_after(&self, delay: Duration, segments: Vec<Segment>) {
		self.state.lock().unwrap().responses.push_back(Response {
			delay,
			result: Ok(segments),
		});
	}

	pub fn fail(&self, err: &str) {
		self.state.lock().unwrap().responses.push_back(Response {
			delay: Duration::ZERO,
			result: Err(anyhow::anyhow!(err.to_string())),
		});
	}

	pub fn calls(&self) -> Vec<(Timestamp, usize)> {
		self.state.lock().unwrap().calls.clone()
	}
}

impl SegmentQuery for MockQuery {
	fn query(
		&self,
		_object: &str,
		from: Timestamp,
		limit: usize,
	) -> impl Future<Output = anyhow::Result<Vec<Segment>>> + Send {
		let mut state = self.state.lock().unwrap();
		state.calls.push((from, limit));
		let response = state.responses.pop_front().unwrap_or(Response {
			delay: Duration::ZERO,
			result: Ok(Vec::new()),
		});

		async move {
			if !response.delay.is_zero() {
				tokio::time::sleep(response.delay).await;
			}
			response.result
		}
	}
}

#[derive(Clone, Default)]
pub struct MockMetadata {
	pub object_fps: Option<f64>,
	pub recording_fps: Option<f64>,
	pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl MetadataQuery for MockMetadata {
	fn object_state(&self, _object: &str) -> impl Future<Output = anyhow::Result<FrameRate>> + Send {
		self.calls.lock().unwrap().push("object_state");
		let fps = self.object_fps;
		async move { Ok(FrameRate { fps }) }
	}

	fn recording_info(
		&self,
		_object: &str,
		_from: Timestamp,
		_limit: usize,
	) -> impl Future<Output = anyhow::Result<FrameRate>> + Send {
		self.calls.lock().unwrap().push("recording_info");
		let fps = self.recording_fps;
		async move { Ok(FrameRate { fps }) }
	}
}
