use std::collections::VecDeque;

use futures::StreamExt;

use super::Event;
use crate::{
	DecodeBackend, Decoder, DecoderEvent, Error, LiveConfig, Overlay, OverlayBuffer, OverlayDebounce, Presentation,
	PushEvent, PushSource, RenderSink, Timestamp,
};

enum Step<P> {
	Decoded(DecoderEvent<P>),
	Pushed(Option<PushEvent>),
}

struct Subscription<T> {
	stream_id: String,
	events: T,
}

/// Plays a push stream as fast as it arrives.
///
/// Live envelopes carry no timestamp, so every picture is reported at [Timestamp::ZERO].
pub struct LivePlayer<B: DecodeBackend, S: PushSource, R> {
	source: S,
	render: R,
	decoder: Decoder<B>,
	overlay: OverlayBuffer,
	subscription: Option<Subscription<S::Subscription>>,
	playing: bool,
	events: VecDeque<Event>,
}

impl<B, S, R> LivePlayer<B, S, R>
where
	B: DecodeBackend,
	S: PushSource,
	R: RenderSink<B::Picture>,
{
	pub fn new(config: LiveConfig, source: S, backend: B, render: R) -> Self {
		let debounce = OverlayDebounce {
			frames: config.overlay_debounce,
		};

		Self {
			source,
			render,
			decoder: Decoder::new(backend, config.decoder),
			overlay: OverlayBuffer::new(debounce),
			subscription: None,
			playing: true,
			events: VecDeque::new(),
		}
	}

	/// Subscribe to a stream, replacing any current subscription.
	pub fn start(&mut self, stream_id: &str) -> crate::Result<()> {
		self.close();

		let events = self.source.subscribe(stream_id).map_err(Error::stream)?;
		tracing::info!(%stream_id, "subscribed to live stream");

		self.subscription = Some(Subscription {
			stream_id: stream_id.to_string(),
			events,
		});

		Ok(())
	}

	/// Drive the player, returning the next event or None once closed.
	pub async fn next(&mut self) -> Option<Event> {
		loop {
			if let Some(event) = self.events.pop_front() {
				return Some(event);
			}

			// Decoded output goes first so it's never starved by a busy stream.
			if let Some(event) = self.decoder.try_event() {
				self.decoded(event);
				continue;
			}

			let subscription = self.subscription.as_mut()?;

			let step = tokio::select! {
				biased;
				event = self.decoder.next_event() => Step::Decoded(event),
				event = subscription.events.next() => Step::Pushed(event),
			};

			match step {
				Step::Decoded(event) => self.decoded(event),
				Step::Pushed(Some(event)) => self.pushed(event),
				Step::Pushed(None) => {
					if let Some(subscription) = &self.subscription {
						tracing::debug!(stream_id = %subscription.stream_id, "live stream closed by the source");
					}
					self.close();
				}
			}
		}
	}

	fn pushed(&mut self, event: PushEvent) {
		match event {
			PushEvent::Start => {
				tracing::info!("live stream started");
				self.overlay.reset();
				self.show(Overlay::Start);
			}
			PushEvent::EndOfStream => {
				tracing::info!("live stream ended");
				self.overlay.reset();
				self.show(Overlay::EndOfStream);
				self.events.push_back(Event::EndOfStream);
			}
			PushEvent::Data(data) => {
				if let Err(err) = self.decoder.decode(data, Presentation::Display(Timestamp::ZERO)) {
					self.fail(err);
				}
			}
			PushEvent::Error(err) => self.fail(Error::Stream(err)),
		}
	}

	fn decoded(&mut self, event: DecoderEvent<B::Picture>) {
		match event {
			DecoderEvent::Changed(info) => {
				self.show(Overlay::Start);
				self.events.push_back(Event::Changed(info));
			}
			DecoderEvent::Picture(picture) => {
				self.overlay.decoded();
				if self.playing {
					self.render.present(picture.picture);
				}
				self.events.push_back(Event::Frame {
					timestamp: picture.timestamp.timestamp(),
				});
			}
			DecoderEvent::Error(err) => self.fail(err.into()),
		}
	}

	fn fail(&mut self, err: Error) {
		tracing::warn!(%err, "live playback failed");
		self.show(Overlay::Error(err.clone()));
		self.events.push_back(Event::Error(err));
		self.close();
	}

	fn show(&mut self, overlay: Overlay) {
		if let Some(overlay) = self.overlay.show(overlay, self.playing) {
			self.render.overlay(&overlay);
		}
	}

	pub fn pause(&mut self) {
		self.playing = false;
	}

	/// Resume painting, drawing the overlay held while paused (if any).
	pub fn resume(&mut self) {
		self.playing = true;
		if let Some(overlay) = self.overlay.resume() {
			self.render.overlay(&overlay);
		}
	}

	pub fn toggle_pause(&mut self) {
		match self.playing {
			true => self.pause(),
			false => self.resume(),
		}
	}

	pub fn is_playing(&self) -> bool {
		self.playing
	}

	pub fn decoder(&self) -> &Decoder<B> {
		&self.decoder
	}

	/// Unsubscribe and tear down the decoder.
	///
	/// Events already reported are still returned by [Self::next].
	pub fn close(&mut self) {
		if let Some(subscription) = self.subscription.take() {
			self.source.unsubscribe(&subscription.stream_id);
		}
		self.decoder.close();
	}
}
