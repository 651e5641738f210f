//! Common types and constants for the Lingvo LSD format
//!
//! This module defines the error type, the decoder variant selection and the
//! format constants shared by the bit-level decoders and the container layer.

use thiserror::Error;

/// Dictionary decoder variant, selected once from the container version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    /// User dictionaries (Lingvo 11/12, x5 and x6 user dictionaries)
    User,
    /// Lingvo x3 system dictionaries
    SystemV13,
    /// Lingvo x5/x6 system dictionaries
    SystemV14,
    /// Abbreviation dictionaries (x5/x6), tables XOR-masked at load time
    Abbreviation,
}

impl DecoderKind {
    /// Select the decoder variant for a raw container version
    pub fn from_version(version: u32) -> Result<Self> {
        match version >> 16 {
            0x11 | 0x12 => return Ok(DecoderKind::User),
            0x13 => return Ok(DecoderKind::SystemV13),
            _ => {}
        }

        match version {
            VERSION_X5_USER | VERSION_X6_USER => Ok(DecoderKind::User),
            VERSION_X5_SYSTEM | VERSION_X6_SYSTEM => Ok(DecoderKind::SystemV14),
            VERSION_X5_ABBREVIATION | VERSION_X6_ABBREVIATION => Ok(DecoderKind::Abbreviation),
            _ => Err(LsdError::UnsupportedVersion(version)),
        }
    }

    /// Human readable variant name
    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::User => "UserDictionaryDecoder",
            DecoderKind::SystemV13 => "SystemDictionaryDecoder13",
            DecoderKind::SystemV14 => "SystemDictionaryDecoder14",
            DecoderKind::Abbreviation => "AbbreviationDictionaryDecoder",
        }
    }
}

/// Error type for LSD decoding
#[derive(Debug, Error)]
pub enum LsdError {
    /// A read ran past the end of the buffer
    #[error("Read out of bounds: {needed} bytes at offset {offset:#x}, buffer length {len:#x}")]
    OutOfBounds {
        /// Byte offset of the failed read
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Length of the buffer
        len: usize,
    },

    /// More than 32 bits requested in a single read
    #[error("Too many bits for one read: {0} (maximum 32)")]
    TooManyBits(u32),

    /// A decoded symbol falls outside its table or character range
    #[error("Symbol {value:#x} out of range (limit {limit:#x})")]
    SymbolOutOfRange {
        /// Offending symbol index or value
        value: u32,
        /// Table length or maximum permitted value
        limit: u32,
    },

    /// A Huffman table is malformed
    #[error("Corrupt Huffman tree: {0}")]
    CorruptHuffmanTree(String),

    /// A structural assertion of the format does not hold
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// A back-reference points outside its copy source
    #[error("Invalid back-reference: start {start}, length {length}, {available} units available")]
    InvalidBackReference {
        /// Start index of the copy
        start: usize,
        /// Number of units to copy
        length: usize,
        /// Units available in the copy source
        available: usize,
    },

    /// No decoder variant exists for this container version
    #[error("Unsupported dictionary version: {0:#x}")]
    UnsupportedVersion(u32),

    /// Header identifier is not `LingVo`
    #[error("Invalid magic: expected \"LingVo\", found {0:?}")]
    MagicMismatch(String),

    /// Number of decoded headings differs from the header
    #[error("Decoded entry count mismatch: expected {expected}, found {found}")]
    EntryCountMismatch {
        /// Entry count declared by the header
        expected: u32,
        /// Heading records enumerated from the pages
        found: u32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for LSD operations
pub type Result<T> = std::result::Result<T, LsdError>;

// Format constants

/// Header identifier, NUL-padded to 8 bytes on disk
pub const LSD_MAGIC: &str = "LingVo";

/// Size of one B-tree page in the pages region
pub const PAGE_SIZE: usize = 512;

/// Initial key of every stream cipher range
pub const CIPHER_SEED: u8 = 0x7F;

/// XOR mask applied to abbreviation symbol table entries
pub const ABBREVIATION_SYMBOL_MASK: u32 = 0x1325;

/// XOR mask applied to abbreviation prefix characters
pub const ABBREVIATION_PREFIX_MASK: u16 = 0x879A;

/// Article size escape: the real size follows as a 32-bit field
pub const ARTICLE_SIZE_ESCAPE: u32 = 0xFFFF;

/// Lingvo x5 system dictionary
pub const VERSION_X5_SYSTEM: u32 = 0x141004;
/// Lingvo x5 user dictionary
pub const VERSION_X5_USER: u32 = 0x142001;
/// Lingvo x5 abbreviation dictionary
pub const VERSION_X5_ABBREVIATION: u32 = 0x145001;
/// Lingvo x6 system dictionary (ciphered)
pub const VERSION_X6_SYSTEM: u32 = 0x151005;
/// Lingvo x6 user dictionary
pub const VERSION_X6_USER: u32 = 0x152001;
/// Lingvo x6 abbreviation dictionary
pub const VERSION_X6_ABBREVIATION: u32 = 0x155001;

/// Whether a container version runs the stream cipher over its sections
pub fn is_ciphered(version: u32) -> bool {
    version == VERSION_X6_SYSTEM
}

/// Number of bits needed to hold `value`, never less than one
///
/// `bit_length(0) == 1`, `bit_length(4) == 3`.
pub const fn bit_length(value: u32) -> u32 {
    u32::BITS - (value | 1).leading_zeros()
}
