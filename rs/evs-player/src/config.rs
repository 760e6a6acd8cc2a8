use std::time::Duration;

/// Decoder acceleration preferences.
#[derive(Clone, Debug, PartialEq, Eq, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct DecoderConfig {
	/// Prefer hardware accelerated decoding.
	#[arg(
		id = "decoder-hardware-acceleration",
		long = "decoder-hardware-acceleration",
		env = "EVS_DECODER_HARDWARE_ACCELERATION",
		default_value_t = true,
		action = clap::ArgAction::Set
	)]
	pub hardware_acceleration: bool,

	/// Retry in software once if hardware decoding fails.
	#[arg(
		id = "decoder-fallback-to-software",
		long = "decoder-fallback-to-software",
		env = "EVS_DECODER_FALLBACK_TO_SOFTWARE",
		default_value_t = true,
		action = clap::ArgAction::Set
	)]
	pub fallback_to_software: bool,
}

impl Default for DecoderConfig {
	fn default() -> Self {
		Self {
			hardware_acceleration: true,
			fallback_to_software: true,
		}
	}
}

/// Configuration for a [crate::LivePlayer].
#[derive(Clone, Debug, PartialEq, Eq, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct LiveConfig {
	#[command(flatten)]
	#[serde(default)]
	pub decoder: DecoderConfig,

	/// Discard a held overlay once more than this many pictures were decoded since the stream started or ended.
	#[arg(id = "overlay-debounce", long = "overlay-debounce", env = "EVS_OVERLAY_DEBOUNCE", default_value_t = 10)]
	pub overlay_debounce: u32,
}

impl Default for LiveConfig {
	fn default() -> Self {
		Self {
			decoder: DecoderConfig::default(),
			overlay_debounce: 10,
		}
	}
}

/// Configuration for a [crate::RecordedPlayer].
#[derive(Clone, Debug, PartialEq, Eq, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct RecordedConfig {
	#[command(flatten)]
	#[serde(default)]
	pub decoder: DecoderConfig,

	/// How much to fetch when starting or seeking.
	#[arg(
		id = "initial-fetch",
		long = "initial-fetch",
		env = "EVS_INITIAL_FETCH",
		default_value = "2s",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub initial_fetch: Duration,

	/// How much to fetch when replenishing the buffer.
	#[arg(
		id = "fetch",
		long = "fetch",
		env = "EVS_FETCH",
		default_value = "10s",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub fetch: Duration,

	/// Replenish the buffer once it holds less than this much.
	#[arg(
		id = "prefetch",
		long = "prefetch",
		env = "EVS_PREFETCH",
		default_value = "3s",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub prefetch: Duration,

	/// The number of displayed timestamps kept for stepping backwards.
	#[arg(id = "history", long = "history", env = "EVS_HISTORY", default_value_t = crate::history::CAPACITY)]
	pub history: usize,
}

impl Default for RecordedConfig {
	fn default() -> Self {
		Self {
			decoder: DecoderConfig::default(),
			initial_fetch: Duration::from_secs(2),
			fetch: Duration::from_secs(10),
			prefetch: Duration::from_secs(3),
			history: crate::history::CAPACITY,
		}
	}
}
