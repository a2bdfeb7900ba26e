use thiserror::Error;

/// Compression applied to a persisted payload (header bits 1-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionMethod {
	#[default]
	None = 0,
	GZip = 1,
	Lz4 = 2,
	Zstd = 3,
}

impl CompressionMethod {
	const fn from_bits(bits: u8) -> Self {
		match bits & 0b11 {
			0 => Self::None,
			1 => Self::GZip,
			2 => Self::Lz4,
			_ => Self::Zstd,
		}
	}
}

bitflags::bitflags! {
	/// One-byte header preceding every persisted series payload.
	///
	/// ```text
	///  7 6 5 4 3 2 1 0
	/// +-+---+-+-+---+-+
	/// |R|CNV|R|T|CMP|B|
	/// +-+---+-+-+---+-+
	/// ```
	///
	/// `B` marks a binary (non-text) payload, `CMP` is the [`CompressionMethod`],
	/// `T` means every value is prefixed with a timestamp and `CNV` is the
	/// converter layout version. Both `R` bits must be zero.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PayloadHeader: u8 {
		const BINARY = 1 << 0;
		const COMPRESSION = 0b0000_0110;
		const TIMESTAMPED = 1 << 3;
		const RESERVED_LOW = 1 << 4;
		const CONVERTER_VERSION = 0b0110_0000;
		const RESERVED_HIGH = 1 << 7;
	}
}

/// Errors raised while decoding a [`PayloadHeader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
	/// One of the must-be-zero bits was set.
	#[error("reserved payload header bits set: {0:#010b}")]
	ReservedBits(u8),
	/// Converter versions only have two bits.
	#[error("converter version {0} does not fit in the header")]
	ConverterVersion(u8),
}

const COMPRESSION_SHIFT: u8 = 1;
const VERSION_SHIFT: u8 = 5;

impl PayloadHeader {
	/// Builds a header from its fields.
	///
	/// Fails if `converter_version` does not fit in two bits.
	pub fn new(binary: bool, compression: CompressionMethod, timestamped: bool, converter_version: u8) -> Result<Self, HeaderError> {
		if converter_version > 0b11 {
			return Err(HeaderError::ConverterVersion(converter_version));
		}
		let mut header = Self::from_bits_retain(((compression as u8) << COMPRESSION_SHIFT) | (converter_version << VERSION_SHIFT));
		header.set(Self::BINARY, binary);
		header.set(Self::TIMESTAMPED, timestamped);
		Ok(header)
	}

	/// Decodes a header byte, rejecting reserved bits.
	pub fn decode(byte: u8) -> Result<Self, HeaderError> {
		let reserved = byte & (Self::RESERVED_LOW | Self::RESERVED_HIGH).bits();
		if reserved != 0 {
			return Err(HeaderError::ReservedBits(byte));
		}
		Ok(Self::from_bits_retain(byte))
	}

	/// Encodes the header as its wire byte.
	#[inline]
	pub const fn encode(self) -> u8 {
		self.bits()
	}

	/// Payload is binary rather than text.
	#[inline]
	pub const fn is_binary(self) -> bool {
		self.contains(Self::BINARY)
	}

	/// Payload entries are prefixed with a timestamp.
	#[inline]
	pub const fn is_timestamped(self) -> bool {
		self.contains(Self::TIMESTAMPED)
	}

	/// Compression applied to the payload.
	#[inline]
	pub const fn compression(self) -> CompressionMethod {
		CompressionMethod::from_bits(self.bits() >> COMPRESSION_SHIFT)
	}

	/// Layout version of the payload converter (0..=3).
	#[inline]
	pub const fn converter_version(self) -> u8 {
		(self.bits() & Self::CONVERTER_VERSION.bits()) >> VERSION_SHIFT
	}

	/// Returns a copy with a different compression method.
	#[must_use]
	pub fn with_compression(self, compression: CompressionMethod) -> Self {
		let cleared = self.bits() & !Self::COMPRESSION.bits();
		Self::from_bits_retain(cleared | ((compression as u8) << COMPRESSION_SHIFT))
	}
}
