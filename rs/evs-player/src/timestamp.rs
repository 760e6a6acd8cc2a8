use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timestamp out of range")]
pub struct TimestampOverflow;

/// A point on a recording's timeline, in microseconds.
///
/// Recordings are addressed in milliseconds, but decoders take microseconds, so that's what we store.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
	pub const ZERO: Self = Self(0);
	pub const MAX: Self = Self(u64::MAX);

	pub const fn from_micros(micros: u64) -> Self {
		Self(micros)
	}

	pub const fn from_millis(millis: u64) -> Result<Self, TimestampOverflow> {
		match millis.checked_mul(1_000) {
			Some(micros) => Ok(Self(micros)),
			None => Err(TimestampOverflow),
		}
	}

	pub const fn from_secs(secs: u64) -> Result<Self, TimestampOverflow> {
		match secs.checked_mul(1_000) {
			Some(millis) => Self::from_millis(millis),
			None => Err(TimestampOverflow),
		}
	}

	/// For constants and tests; panics when out of range.
	pub const fn from_millis_unchecked(millis: u64) -> Self {
		match Self::from_millis(millis) {
			Ok(timestamp) => timestamp,
			Err(_) => panic!("timestamp out of range"),
		}
	}

	pub const fn as_micros(self) -> u64 {
		self.0
	}

	/// Truncated to whole milliseconds.
	pub const fn as_millis(self) -> u64 {
		self.0 / 1_000
	}

	pub fn checked_add(self, rhs: Self) -> Option<Self> {
		Some(Self(self.0.checked_add(rhs.0)?))
	}

	pub fn checked_sub(self, rhs: Self) -> Option<Self> {
		Some(Self(self.0.checked_sub(rhs.0)?))
	}

	/// Clamps at [Self::MAX], so a cursor at the end of the timeline stays there.
	pub fn saturating_add(self, rhs: Self) -> Self {
		Self(self.0.saturating_add(rhs.0))
	}
}

impl TryFrom<Duration> for Timestamp {
	type Error = TimestampOverflow;

	fn try_from(duration: Duration) -> Result<Self, Self::Error> {
		u64::try_from(duration.as_micros())
			.map(Self)
			.map_err(|_| TimestampOverflow)
	}
}

impl From<Timestamp> for Duration {
	fn from(timestamp: Timestamp) -> Self {
		Self::from_micros(timestamp.0)
	}
}

// Milliseconds, with the sub-millisecond part only when there is one.
impl fmt::Display for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 % 1_000 {
			0 => write!(f, "{}ms", self.0 / 1_000),
			micros => write!(f, "{}.{:03}ms", self.0 / 1_000, micros),
		}
	}
}

impl fmt::Debug for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Timestamp({self})")
	}
}

/// When a submitted frame should be shown.
///
/// Frames between a seek target's key unit and the target itself are decoded to prime the
/// decoder, but must not be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
	/// Decode and draw.
	Display(Timestamp),

	/// Decode only.
	Skip(Timestamp),
}

impl Presentation {
	/// The absolute timestamp, regardless of visibility.
	pub fn timestamp(self) -> Timestamp {
		match self {
			Self::Display(timestamp) | Self::Skip(timestamp) => timestamp,
		}
	}

	pub fn is_visible(self) -> bool {
		matches!(self, Self::Display(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_units() {
		let ts = Timestamp::from_millis(1500).unwrap();
		assert_eq!(ts.as_micros(), 1_500_000);
		assert_eq!(ts.as_millis(), 1500);
		assert_eq!(Duration::from(ts), Duration::from_millis(1500));
		assert_eq!(Timestamp::from_secs(2).unwrap(), Timestamp::from_millis_unchecked(2000));
		assert_eq!(Timestamp::from_secs(u64::MAX), Err(TimestampOverflow));
		assert_eq!(Timestamp::try_from(Duration::from_micros(1_500_250)).unwrap().as_millis(), 1500);
	}

	#[test]
	fn test_display() {
		assert_eq!(Timestamp::from_millis_unchecked(401).to_string(), "401ms");
		assert_eq!(Timestamp::from_micros(1_500_250).to_string(), "1500.250ms");
		assert_eq!(format!("{:?}", Timestamp::ZERO), "Timestamp(0ms)");
	}

	#[test]
	fn test_overflow() {
		assert_eq!(Timestamp::from_millis(u64::MAX), Err(TimestampOverflow));
		assert_eq!(Timestamp::MAX.checked_add(Timestamp::from_micros(1)), None);
		assert_eq!(Timestamp::MAX.saturating_add(Timestamp::from_micros(1)), Timestamp::MAX);
		assert_eq!(Timestamp::ZERO.checked_sub(Timestamp::from_micros(1)), None);
	}

	#[test]
	fn test_presentation_zero_is_unambiguous() {
		let skip = Presentation::Skip(Timestamp::ZERO);
		assert!(!skip.is_visible());
		assert_eq!(skip.timestamp(), Timestamp::ZERO);
		assert!(Presentation::Display(Timestamp::ZERO).is_visible());
	}
}
