use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The codec of a frame, as carried in the envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Codec {
	Raw = 0,
	H264 = 10,
	H265 = 11,
	VP8 = 12,
	VP9 = 13,
	AV1 = 14,
}

impl Codec {
	/// The WebCodecs codec string used to configure a decoder.
	///
	/// Raw frames need no decoder, so there is none.
	pub fn webcodecs(self) -> Option<&'static str> {
		match self {
			Self::Raw => None,
			Self::H264 => Some("avc1.42E01E"),
			Self::H265 => Some("hvc1.1.6.L93.00"),
			Self::VP8 => Some("vp8"),
			Self::VP9 => Some("vp09.00.10.08"),
			Self::AV1 => Some("av01.0.05M.08"),
		}
	}

	/// The acceleration hint for a session of this codec.
	///
	/// VP8 decoders don't take a hint.
	pub fn hardware_acceleration(self, hardware: bool) -> HardwareAcceleration {
		match self {
			Self::VP8 => HardwareAcceleration::NoPreference,
			_ if hardware => HardwareAcceleration::PreferHardware,
			_ => HardwareAcceleration::PreferSoftware,
		}
	}
}

impl fmt::Display for Codec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Raw => "raw",
			Self::H264 => "h264",
			Self::H265 => "h265",
			Self::VP8 => "vp8",
			Self::VP9 => "vp9",
			Self::AV1 => "av1",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareAcceleration {
	NoPreference,
	PreferHardware,
	PreferSoftware,
}
