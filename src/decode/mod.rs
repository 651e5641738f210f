//! LSD decoding core
//!
//! Everything here works on bytes already in memory: a bit cursor, the
//! keystream cipher of x6 system dictionaries, the Huffman tables embedded in
//! every dictionary, the variant-specific symbol decoders and heading records.
//! Nothing in this module touches the filesystem.

pub mod bitstream;
pub mod cipher;
pub mod dictionary;
pub mod heading;
pub mod huffman;

pub use bitstream::BitReader;
pub use cipher::{decode_range, StreamCipher, SBOX};
pub use dictionary::{ArticleSymbol, DictionaryDecoder};
pub use heading::{read_heading, ArticleEntry, Extension, Heading, HeadingRegistry};
pub use huffman::HuffmanTable;
