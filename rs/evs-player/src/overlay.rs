use crate::Error;

/// A status message drawn over the video surface instead of a picture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Overlay {
	#[default]
	None,

	/// Connecting or (re)configuring.
	Start,

	EndOfStream,

	Error(Error),
}

impl Overlay {
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}
}

/// Stops replaying a held overlay once the stream is clearly producing pictures again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayDebounce {
	/// The held overlay is discarded once more than this many pictures were decoded
	/// since the last start or end of stream.
	pub frames: u32,
}

impl Default for OverlayDebounce {
	fn default() -> Self {
		Self { frames: 10 }
	}
}

impl OverlayDebounce {
	fn expired(&self, decoded: u32) -> bool {
		decoded > self.frames
	}
}

/// Holds the latest overlay while paused so it can be drawn once on resume.
#[derive(Debug, Default)]
pub struct OverlayBuffer {
	held: Overlay,
	debounce: OverlayDebounce,
	decoded: u32,
}

impl OverlayBuffer {
	pub fn new(debounce: OverlayDebounce) -> Self {
		Self {
			held: Overlay::None,
			debounce,
			decoded: 0,
		}
	}

	/// Returns the overlay to draw right away, or holds it while paused.
	///
	/// A held overlay is replaced, not queued.
	pub fn show(&mut self, overlay: Overlay, playing: bool) -> Option<Overlay> {
		if playing {
			return Some(overlay);
		}

		self.held = overlay;
		None
	}

	/// Returns the held overlay, if any, exactly once.
	pub fn resume(&mut self) -> Option<Overlay> {
		match std::mem::take(&mut self.held) {
			Overlay::None => None,
			overlay => Some(overlay),
		}
	}

	/// Count a decoded picture.
	pub fn decoded(&mut self) {
		self.decoded = self.decoded.saturating_add(1);
		if self.debounce.expired(self.decoded) {
			self.held = Overlay::None;
		}
	}

	/// The stream started or ended.
	pub fn reset(&mut self) {
		self.decoded = 0;
	}

	pub fn held(&self) -> &Overlay {
		&self.held
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_playing_draws_immediately() {
		let mut buffer = OverlayBuffer::default();
		assert_eq!(buffer.show(Overlay::Start, true), Some(Overlay::Start));
		assert!(buffer.held().is_none());
		assert_eq!(buffer.resume(), None);
	}

	#[test]
	fn test_paused_last_write_wins() {
		let mut buffer = OverlayBuffer::default();
		assert_eq!(buffer.show(Overlay::Start, false), None);
		assert_eq!(buffer.show(Overlay::EndOfStream, false), None);

		assert_eq!(buffer.resume(), Some(Overlay::EndOfStream));
		assert_eq!(buffer.resume(), None);
	}

	#[test]
	fn test_debounce() {
		let mut buffer = OverlayBuffer::new(OverlayDebounce { frames: 2 });
		buffer.show(Overlay::Start, false);

		buffer.decoded();
		buffer.decoded();
		assert_eq!(buffer.held(), &Overlay::Start);

		buffer.decoded();
		assert!(buffer.held().is_none());

		// The counter restarts with the stream.
		buffer.reset();
		buffer.show(Overlay::EndOfStream, false);
		buffer.decoded();
		assert_eq!(buffer.resume(), Some(Overlay::EndOfStream));
	}
}
