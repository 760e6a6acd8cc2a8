use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Codec, FormatError};

/// The envelope magic, `EVS`.
pub const MAGIC: [u8; 3] = *b"EVS";

/// The only envelope version we understand.
pub const VERSION: u8 = 1;

/// Magic, version, codec, width, height and flags.
pub const HEADER_SIZE: usize = 10;

const FLAG_KEY: u8 = 0x01;

/// A single encoded video frame, parsed from its envelope.
///
/// The codec and dimensions come from the header; the payload is handed to the decoder untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
	pub codec: Codec,
	pub width: u16,
	pub height: u16,

	/// Whether the frame can be decoded without reference to prior frames.
	pub key: bool,

	/// Everything after the header, sliced from the original buffer.
	pub payload: Bytes,
}

impl Frame {
	/// Parse an envelope.
	pub fn decode(mut buf: Bytes) -> Result<Self, FormatError> {
		if buf.len() < HEADER_SIZE {
			return Err(FormatError::Short(buf.len()));
		}

		if buf[..3] != MAGIC {
			return Err(FormatError::InvalidMagic);
		}
		buf.advance(3);

		let version = buf.get_u8();
		if version != VERSION {
			return Err(FormatError::UnsupportedVersion(version));
		}

		let id = buf.get_u8();
		let codec = Codec::try_from(id).map_err(|_| FormatError::UnsupportedCodec(id))?;

		let width = buf.get_u16_le();
		let height = buf.get_u16_le();
		let flags = buf.get_u8();

		Ok(Self {
			codec,
			width,
			height,
			key: flags & FLAG_KEY != 0,
			payload: buf,
		})
	}

	/// Produce the envelope for this frame.
	pub fn encode(&self) -> Bytes {
		let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
		buf.put_slice(&MAGIC);
		buf.put_u8(VERSION);
		buf.put_u8(self.codec.into());
		buf.put_u16_le(self.width);
		buf.put_u16_le(self.height);
		buf.put_u8(if self.key { FLAG_KEY } else { 0 });
		buf.put_slice(&self.payload);
		buf.freeze()
	}
}
