//! The decode session state machine.
//!
//! A [Decoder] owns at most one backend session at a time. It parses each envelope,
//! (re)creates the session when the codec or resolution changes, refuses delta frames until a
//! key unit arrives, and falls back from hardware to software decoding once when allowed.
//!
//! Everything the session produces is funneled through a single channel so the owner observes
//! [DecoderEvent::Changed] strictly before the pictures of the new session.

mod backend;
mod state;

pub use backend::*;
pub use state::DecoderState;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{Codec, DecodeError, DecoderConfig, Frame, Presentation, Result};
use backend::Output;
use state::Transition;

/// Reported to the owner every time a session is (re)created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
	pub width: u16,
	pub height: u16,
	pub codec: Codec,
	pub hardware_acceleration: bool,
}

/// What happened to a frame passed to [Decoder::decode].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
	/// Submitted to the backend.
	Accepted,

	/// Not submitted: waiting for a key unit, or a software fallback is pending.
	Dropped,
}

struct Session<S: DecodeSession> {
	codec: Codec,
	width: u16,
	height: u16,
	hardware: bool,
	key_frame_seen: bool,
	handle: S,
}

impl<S: DecodeSession> Session<S> {
	fn matches(&self, frame: &Frame) -> bool {
		self.codec == frame.codec && self.width == frame.width && self.height == frame.height
	}

	fn close(mut self) {
		if let Err(err) = self.handle.close() {
			tracing::debug!(%err, "ignoring error while closing decoder session");
		}
	}
}

pub struct Decoder<B: DecodeBackend> {
	backend: B,
	config: DecoderConfig,
	state: DecoderState,
	session: Option<Session<B::Session>>,

	// Whether the current (or next fallback) session uses hardware acceleration.
	hardware: bool,

	// Bumped on every new session and on close. Pictures and errors of older generations are dropped.
	generation: u64,

	tx: mpsc::UnboundedSender<Output<B::Picture>>,
	rx: mpsc::UnboundedReceiver<Output<B::Picture>>,
}

impl<B: DecodeBackend> Decoder<B> {
	pub fn new(backend: B, config: DecoderConfig) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();

		Self {
			backend,
			hardware: config.hardware_acceleration,
			config,
			state: DecoderState::Idle,
			session: None,
			generation: 0,
			tx,
			rx,
		}
	}

	pub fn state(&self) -> DecoderState {
		self.state
	}

	pub fn config(&self) -> &DecoderConfig {
		&self.config
	}

	/// Takes effect the next time a session is created.
	pub fn set_preferred_hardware_acceleration(&mut self, enabled: bool) {
		self.config.hardware_acceleration = enabled;
	}

	pub fn set_fallback_to_software(&mut self, enabled: bool) {
		self.config.fallback_to_software = enabled;
	}

	/// Whether the active (or pending) session uses hardware acceleration.
	pub fn is_hardware_acceleration_enabled(&self) -> bool {
		self.hardware
	}

	pub fn stream_info(&self) -> Option<StreamInfo> {
		self.session.as_ref().map(|session| StreamInfo {
			width: session.width,
			height: session.height,
			codec: session.codec,
			hardware_acceleration: session.hardware,
		})
	}

	/// Parse an envelope and decode it.
	pub fn decode(&mut self, data: Bytes, timestamp: Presentation) -> Result<DecodeStatus> {
		let frame = Frame::decode(data)?;
		self.decode_frame(frame, timestamp)
	}

	pub fn decode_frame(&mut self, frame: Frame, timestamp: Presentation) -> Result<DecodeStatus> {
		if self.state == DecoderState::Closed {
			return Err(DecodeError::Closed.into());
		}

		if frame.codec.webcodecs().is_none() {
			return Err(DecodeError::UnsupportedCodec(frame.codec).into());
		}

		let mut session = match self.session.take() {
			Some(session) if session.matches(&frame) && !session.handle.is_closed() => session,
			old => match self.open(old, &frame) {
				Ok(session) => session,
				Err(err) => return self.fail(err),
			},
		};

		if !session.key_frame_seen {
			if !frame.key {
				self.session = Some(session);
				return Ok(DecodeStatus::Dropped);
			}

			session.key_frame_seen = true;
		}

		let chunk = EncodedChunk {
			payload: frame.payload,
			key: frame.key,
			timestamp,
		};

		match session.handle.submit(chunk) {
			Ok(()) => {
				self.session = Some(session);
				Ok(DecodeStatus::Accepted)
			}
			Err(err) => {
				session.close();
				self.fail(err)
			}
		}
	}

	fn open(
		&mut self,
		old: Option<Session<B::Session>>,
		frame: &Frame,
	) -> std::result::Result<Session<B::Session>, DecodeError> {
		if let Some(old) = old {
			old.close();
		}

		// A pending fallback forces software, otherwise go back to the preference.
		let hardware = match self.state {
			DecoderState::ConfiguringSoftware => false,
			_ => self.config.hardware_acceleration,
		};

		self.transition(Transition::Configure { hardware });
		self.hardware = hardware;
		self.generation += 1;

		let config = SessionConfig {
			codec: frame.codec,
			codec_string: frame.codec.webcodecs().ok_or(DecodeError::UnsupportedCodec(frame.codec))?,
			width: frame.width,
			height: frame.height,
			hardware_acceleration: frame.codec.hardware_acceleration(hardware),
			optimize_for_latency: true,
		};

		tracing::debug!(?config, generation = self.generation, "configuring decoder");

		let output = OutputSink::new(self.generation, self.tx.clone());
		let handle = self.backend.open(&config, output)?;

		self.transition(Transition::Configured);

		let session = Session {
			codec: frame.codec,
			width: frame.width,
			height: frame.height,
			hardware,
			key_frame_seen: false,
			handle,
		};

		let info = StreamInfo {
			width: frame.width,
			height: frame.height,
			codec: frame.codec,
			hardware_acceleration: hardware,
		};
		OutputSink::new(self.generation, self.tx.clone()).send(DecoderEvent::Changed(info));

		Ok(session)
	}

	fn fail(&mut self, err: DecodeError) -> Result<DecodeStatus> {
		let fallback = self.hardware && self.config.fallback_to_software;
		self.transition(Transition::Failed { fallback });

		if fallback {
			tracing::info!(%err, "hardware decoding failed, falling back to software");
			self.hardware = false;
			return Ok(DecodeStatus::Dropped);
		}

		tracing::warn!(%err, "decoding failed");
		Err(err.into())
	}

	/// Tear down the session and reset to the initial state.
	pub fn close(&mut self) {
		if let Some(session) = self.session.take() {
			session.close();
		}

		self.transition(Transition::Close);
		self.hardware = self.config.hardware_acceleration;
		self.generation += 1;

		// Nothing produced before a close is reported, not even a change.
		while self.rx.try_recv().is_ok() {}
	}

	/// Return the next event of the current session without blocking.
	pub fn try_event(&mut self) -> Option<DecoderEvent<B::Picture>> {
		while let Ok(output) = self.rx.try_recv() {
			if let Some(event) = self.current(output) {
				return Some(event);
			}
		}

		None
	}

	/// Wait for the next event of the current session.
	pub async fn next_event(&mut self) -> DecoderEvent<B::Picture> {
		loop {
			// We hold a sender, so the channel never closes.
			let Some(output) = self.rx.recv().await else {
				return std::future::pending().await;
			};

			if let Some(event) = self.current(output) {
				return event;
			}
		}
	}

	// Changes are reported once per session, even when the session was already replaced.
	fn current(&self, output: Output<B::Picture>) -> Option<DecoderEvent<B::Picture>> {
		if output.generation == self.generation || matches!(output.event, DecoderEvent::Changed(_)) {
			return Some(output.event);
		}

		tracing::trace!(
			generation = output.generation,
			current = self.generation,
			"dropping stale decoder output"
		);
		None
	}

	fn transition(&mut self, transition: Transition) {
		match self.state.next(transition) {
			Some(next) => self.state = next,
			None => tracing::error!(state = ?self.state, ?transition, "invalid decoder transition"),
		}
	}
}

impl<B: DecodeBackend> Drop for Decoder<B> {
	fn drop(&mut self) {
		if let Some(session) = self.session.take() {
			session.close();
		}
	}
}
