use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::Event;
use crate::{
	DecodeBackend, Decoder, DecoderEvent, Error, MetadataQuery, Overlay, OverlayBuffer, OverlayDebounce,
	PlaybackHistory, Presentation, RecordedConfig, RenderSink, Result, Segment, SegmentQuery, Timestamp,
};

// The fetch cursor moves just past the last frame received.
const FETCH_STEP: Timestamp = Timestamp::from_millis_unchecked(1);

// Interval panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
struct Rate {
	fps: f64,
	frame: Duration,
}

impl Rate {
	fn new(fps: Option<f64>) -> Option<Self> {
		let fps = fps.filter(|fps| fps.is_finite() && *fps > 0.0)?;
		let frame = Duration::try_from_secs_f64(1.0 / fps).ok()?;
		Some(Self { fps, frame })
	}

	// The number of frames covering the given span, at least one.
	fn frames(&self, span: Duration) -> usize {
		((self.fps * span.as_secs_f64()).ceil() as usize).max(1)
	}

	fn period(&self, speed: f64) -> Option<Duration> {
		let period = Duration::try_from_secs_f64(self.frame.as_secs_f64() / speed).ok()?;
		Some(period.max(MIN_PERIOD))
	}
}

/// The frames fetched ahead of the display cursor.
#[derive(Debug, Default)]
struct PlaybackWindow {
	// Frames before this are decoded but not shown.
	anchor: Timestamp,

	// Only moves forward, except on seek.
	next_fetch: Timestamp,

	queue: VecDeque<Segment>,

	// A fetch requested while one is outstanding is dropped, not queued.
	fetch_in_flight: bool,

	// The source stopped advancing; no more fetches.
	stalled: bool,

	// The end of stream was reported for the current empty queue.
	drained: bool,
}

impl PlaybackWindow {
	fn new(anchor: Timestamp) -> Self {
		Self {
			anchor,
			next_fetch: anchor,
			..Default::default()
		}
	}
}

struct Fetched {
	generation: u64,
	initial: bool,
	result: anyhow::Result<Vec<Segment>>,
}

/// Fires the display tick.
struct Scheduler {
	interval: Interval,
	period: Duration,
	next: Instant,
	generation: u64,
}

impl Scheduler {
	fn new(period: Duration, generation: u64) -> Self {
		let next = Instant::now() + period;
		Self {
			interval: Self::interval(next, period),
			period,
			next,
			generation,
		}
	}

	fn interval(start: Instant, period: Duration) -> Interval {
		let mut interval = tokio::time::interval_at(start, period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		interval
	}

	async fn tick(&mut self) -> u64 {
		let at = self.interval.tick().await;
		self.next = at + self.period;
		self.generation
	}

	// The tick that's already scheduled still fires; the new period applies after it.
	fn set_period(&mut self, period: Duration) {
		let start = self.next.max(Instant::now());
		self.interval = Self::interval(start, period);
		self.period = period;
		self.next = start;
	}
}

async fn tick(scheduler: &mut Option<Scheduler>) -> u64 {
	match scheduler {
		Some(scheduler) => scheduler.tick().await,
		None => std::future::pending().await,
	}
}

enum Step<P> {
	Decoded(DecoderEvent<P>),
	Fetched(Fetched),
	Tick(u64),
}

/// Plays back a recording, pulling frames from a [SegmentQuery] ahead of a fixed-rate display tick.
///
/// Fetching, decoding and display run at independent rates: frames are fetched in bulk, decoded
/// one at a time, and displayed every `frame duration / speed`.
pub struct RecordedPlayer<B: DecodeBackend, Q, M, R> {
	config: RecordedConfig,
	query: Arc<Q>,
	metadata: M,
	render: R,
	decoder: Decoder<B>,
	overlay: OverlayBuffer,

	object: String,
	rate: Option<Rate>,
	speed: f64,
	playing: bool,

	window: PlaybackWindow,
	history: PlaybackHistory,

	// Bumped on every close and seek.
	generation: u64,
	fetches: FuturesUnordered<BoxFuture<'static, Fetched>>,
	scheduler: Option<Scheduler>,

	events: VecDeque<Event>,
}

impl<B, Q, M, R> RecordedPlayer<B, Q, M, R>
where
	B: DecodeBackend,
	Q: SegmentQuery,
	M: MetadataQuery,
	R: RenderSink<B::Picture>,
{
	pub fn new(config: RecordedConfig, query: Q, metadata: M, backend: B, render: R) -> Self {
		Self {
			decoder: Decoder::new(backend, config.decoder.clone()),
			history: PlaybackHistory::new(config.history),
			overlay: OverlayBuffer::new(OverlayDebounce::default()),
			config,
			query: Arc::new(query),
			metadata,
			render,
			object: String::new(),
			rate: None,
			speed: 1.0,
			playing: true,
			window: PlaybackWindow::default(),
			generation: 0,
			fetches: FuturesUnordered::new(),
			scheduler: None,
			events: VecDeque::new(),
		}
	}

	/// Start playing `object` from `from`.
	///
	/// Without an explicit frame rate it is looked up in the metadata; if that fails too, the end
	/// of stream is reported and nothing is played.
	pub async fn start(&mut self, object: &str, from: Timestamp, fps: Option<f64>) -> Result<()> {
		self.close();
		self.object = object.to_string();
		self.rate = None;

		let rate = match Rate::new(fps) {
			Some(rate) => Some(rate),
			None => self.lookup_rate(object, from).await?,
		};

		let Some(rate) = rate else {
			tracing::warn!(%object, "unknown frame rate");
			self.end_of_stream();
			return Ok(());
		};

		tracing::debug!(%object, %from, fps = rate.fps, "starting playback");
		self.rate = Some(rate);
		self.goto(from, false)
	}

	async fn lookup_rate(&self, object: &str, from: Timestamp) -> Result<Option<Rate>> {
		let state = self.metadata.object_state(object).await.map_err(Error::fetch)?;
		if let Some(rate) = Rate::new(state.fps) {
			return Ok(Some(rate));
		}

		let info = self
			.metadata
			.recording_info(object, from, 1)
			.await
			.map_err(Error::fetch)?;
		Ok(Rate::new(info.fps))
	}

	/// Drive the player, returning the next event.
	///
	/// Returns None once nothing more can happen: the player was closed or never started, or
	/// playback stopped.
	pub async fn next(&mut self) -> Option<Event> {
		loop {
			if let Some(event) = self.events.pop_front() {
				return Some(event);
			}

			if let Some(event) = self.decoder.try_event() {
				self.decoded(event);
				continue;
			}

			if self.fetches.is_empty() && self.scheduler.is_none() {
				return None;
			}

			let step = tokio::select! {
				biased;
				event = self.decoder.next_event() => Step::Decoded(event),
				Some(fetched) = self.fetches.next(), if !self.fetches.is_empty() => Step::Fetched(fetched),
				generation = tick(&mut self.scheduler) => Step::Tick(generation),
			};

			match step {
				Step::Decoded(event) => self.decoded(event),
				Step::Fetched(fetched) => self.fetched(fetched),
				Step::Tick(generation) if generation == self.generation => {
					if self.playing {
						self.display_next_frame();
					}
				}
				Step::Tick(generation) => {
					tracing::trace!(generation, current = self.generation, "dropping stale tick");
				}
			}
		}
	}

	/// Request the next batch of frames.
	///
	/// Dropped if a fetch is already in flight.
	pub fn fetch_next(&mut self, initial: bool) {
		let Some(rate) = self.rate else {
			return;
		};

		if self.window.fetch_in_flight {
			tracing::trace!("fetch already in flight");
			return;
		}

		let span = match initial {
			true => self.config.initial_fetch,
			false => self.config.fetch,
		};
		let limit = rate.frames(span);
		let from = self.window.next_fetch;
		let generation = self.generation;

		tracing::debug!(object = %self.object, %from, limit, initial, "fetching frames");
		self.window.fetch_in_flight = true;

		let query = self.query.clone();
		let object = self.object.clone();

		self.fetches.push(
			async move {
				let result = query.query(&object, from, limit).await;
				Fetched {
					generation,
					initial,
					result,
				}
			}
			.boxed(),
		);
	}

	fn fetched(&mut self, fetched: Fetched) {
		if fetched.generation != self.generation {
			tracing::debug!(
				generation = fetched.generation,
				current = self.generation,
				"dropping stale fetch"
			);
			return;
		}

		self.window.fetch_in_flight = false;

		let segments = match fetched.result {
			Ok(segments) => segments,
			Err(err) => {
				let err = Error::fetch(err);
				tracing::warn!(%err, object = %self.object, "fetch failed");
				self.events.push_back(Event::Error(err));
				self.pause();
				return;
			}
		};

		tracing::debug!(count = segments.len(), initial = fetched.initial, "fetched frames");

		let Some(last) = segments.last().map(|segment| segment.timestamp) else {
			if fetched.initial {
				self.end_of_stream();
			}
			return;
		};

		if last < self.window.next_fetch {
			tracing::warn!(%last, next = %self.window.next_fetch, "recording is not advancing");
			self.window.stalled = true;
			self.end_of_stream();
			self.pause();
			return;
		}

		self.window.queue.extend(segments);
		self.window.next_fetch = last.saturating_add(FETCH_STEP);
		self.window.drained = false;

		if fetched.initial {
			self.display_next_frame();

			// Nothing to schedule if displaying failed and closed the player.
			if fetched.generation != self.generation {
				return;
			}

			if let Some(period) = self.period() {
				self.scheduler = Some(Scheduler::new(period, self.generation));
			}
		}
	}

	/// Decode queued frames up to and including the next visible one.
	///
	/// Frames before the seek anchor are decoded without being shown.
	pub fn display_next_frame(&mut self) {
		loop {
			let Some(segment) = self.window.queue.pop_front() else {
				if !self.window.drained {
					self.window.drained = true;
					self.end_of_stream();
				}
				return;
			};

			self.prefetch();

			let presentation = match segment.timestamp < self.window.anchor {
				true => Presentation::Skip(segment.timestamp),
				false => Presentation::Display(segment.timestamp),
			};

			match self.decoder.decode(segment.data, presentation) {
				Ok(_) => {}
				Err(Error::Format(err)) => {
					tracing::warn!(%err, timestamp = %segment.timestamp, "skipping invalid frame");
					self.events.push_back(Event::Error(err.into()));
					return;
				}
				Err(err) => return self.fail(err),
			}

			if presentation.is_visible() {
				return;
			}
		}
	}

	// Keep enough frames queued to cover the prefetch window.
	fn prefetch(&mut self) {
		let Some(rate) = self.rate else {
			return;
		};

		if self.window.stalled || self.window.fetch_in_flight {
			return;
		}

		if self.window.queue.len() < rate.frames(self.config.prefetch) {
			self.fetch_next(false);
		}
	}

	fn decoded(&mut self, event: DecoderEvent<B::Picture>) {
		match event {
			DecoderEvent::Changed(info) => self.events.push_back(Event::Changed(info)),
			DecoderEvent::Picture(picture) => {
				self.overlay.decoded();
				self.history.push(picture.timestamp.timestamp());

				if let Presentation::Display(timestamp) = picture.timestamp {
					self.render.present(picture.picture);
					self.events.push_back(Event::Frame { timestamp });
				}
			}
			DecoderEvent::Error(err) => self.fail(err.into()),
		}
	}

	fn fail(&mut self, err: Error) {
		tracing::warn!(%err, object = %self.object, "playback failed");
		self.show(Overlay::Error(err.clone()));
		self.events.push_back(Event::Error(err));
		self.close();
	}

	fn end_of_stream(&mut self) {
		tracing::info!(object = %self.object, "end of recording");
		self.show(Overlay::EndOfStream);
		self.events.push_back(Event::EndOfStream);
	}

	fn show(&mut self, overlay: Overlay) {
		if let Some(overlay) = self.overlay.show(overlay, self.playing) {
			self.render.overlay(&overlay);
		}
	}

	/// Seek to `target`, keeping the playback history if asked to.
	pub fn goto(&mut self, target: Timestamp, keep_history: bool) -> Result<()> {
		if self.rate.is_none() {
			return Err(Error::NotStarted);
		}

		tracing::debug!(%target, keep_history, "seeking");

		self.generation += 1;
		self.scheduler = None;
		self.decoder.close();
		self.window = PlaybackWindow::new(target);

		if !keep_history {
			self.history.clear();
		}

		self.fetch_next(true);
		Ok(())
	}

	/// Pause and show the next frame.
	pub fn step_frame_forward(&mut self) -> Result<()> {
		if self.rate.is_none() {
			return Err(Error::NotStarted);
		}

		self.pause();
		self.display_next_frame();
		Ok(())
	}

	/// Pause and seek to the frame shown before the current one.
	///
	/// Does nothing if there's no earlier frame in the history.
	pub fn step_frame_backward(&mut self) -> Result<()> {
		if self.rate.is_none() {
			return Err(Error::NotStarted);
		}

		self.pause();

		match self.history.step_back() {
			Some(target) => self.goto(target, true),
			None => Ok(()),
		}
	}

	/// Change the playback speed, where 1.0 is real time.
	pub fn set_playback_speed(&mut self, speed: f64) -> Result<()> {
		if !speed.is_finite() || speed <= 0.0 {
			return Err(Error::InvalidSpeed(speed));
		}

		if speed == self.speed {
			return Ok(());
		}

		if let Some(rate) = self.rate {
			let period = rate.period(speed).ok_or(Error::InvalidSpeed(speed))?;
			if let Some(scheduler) = self.scheduler.as_mut() {
				scheduler.set_period(period);
			}
		}

		tracing::debug!(speed, "playback speed changed");
		self.speed = speed;
		Ok(())
	}

	pub fn playback_speed(&self) -> f64 {
		self.speed
	}

	/// The time between two displayed frames at the current speed.
	pub fn frame_interval(&self) -> Result<Duration> {
		self.period().ok_or(Error::NotStarted)
	}

	fn period(&self) -> Option<Duration> {
		self.rate?.period(self.speed)
	}

	/// Stop displaying frames; the tick keeps running.
	pub fn pause(&mut self) {
		self.playing = false;
	}

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

	pub fn history(&self) -> &PlaybackHistory {
		&self.history
	}

	/// The number of frames fetched but not yet displayed.
	pub fn buffered(&self) -> usize {
		self.window.queue.len()
	}

	/// Stop playback and discard buffered frames. The history is kept.
	pub fn close(&mut self) {
		self.generation += 1;
		self.scheduler = None;
		self.fetches = FuturesUnordered::new();
		self.decoder.close();
		self.window.queue.clear();
		self.window.fetch_in_flight = false;
	}
}
