use crate::Codec;

/// An envelope that could not be parsed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
	/// Fewer bytes than the fixed header.
	#[error("frame too short: {0} bytes")]
	Short(usize),

	#[error("invalid magic")]
	InvalidMagic,

	#[error("unsupported version: {0}")]
	UnsupportedVersion(u8),

	#[error("unsupported codec id: {0}")]
	UnsupportedCodec(u8),
}

/// Errors reported by a decode backend, or by the decoder itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("failed to configure decoder: {0}")]
	Configure(String),

	#[error("failed to decode frame: {0}")]
	Submit(String),

	#[error("unsupported codec: {0}")]
	UnsupportedCodec(Codec),

	/// The decoder gave up after a failure and must be closed before reuse.
	#[error("decoder closed")]
	Closed,
}

/// A list of possible errors surfaced by the players.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
	#[error("invalid frame: {0}")]
	Format(#[from] FormatError),

	#[error("decode failure: {0}")]
	Decode(#[from] DecodeError),

	/// A segment or metadata query failed.
	#[error("fetch failed: {0}")]
	Fetch(String),

	/// The push transport reported an error.
	#[error("stream error: {0}")]
	Stream(String),

	#[error("invalid playback speed: {0}")]
	InvalidSpeed(f64),

	/// The frame rate is unknown until the player has been started.
	#[error("not started")]
	NotStarted,
}

impl Error {
	pub(crate) fn fetch(err: anyhow::Error) -> Self {
		Self::Fetch(format!("{err:#}"))
	}

	pub(crate) fn stream(err: anyhow::Error) -> Self {
		Self::Stream(format!("{err:#}"))
	}
}

pub type Result<T> = std::result::Result<T, Error>;
