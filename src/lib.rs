//! lsdreader - Rust decoder for ABBYY Lingvo LSD dictionaries
//!
//! This crate reads the compressed `.lsd` dictionary container used by ABBYY
//! Lingvo 11 through x6 and renders it back to DSL source markup. Headings
//! and articles are Huffman coded against per-dictionary tables and use two
//! kinds of back-reference: copies from a shared prefix block and LZ77-style
//! copies from the article decoded so far. x6 system dictionaries also run a
//! keyed substitution cipher over their sections.
//!
//! # Features
//!
//! - All four decoder variants: user (Lingvo 11/12, x5, x6), system x3,
//!   system x5/x6 and abbreviation dictionaries
//! - x6 section cipher, applied to owned copies so the file image stays
//!   untouched
//! - Homograph merging by article reference
//! - DSL, icon, annotation and prefix output
//! - Optional concurrent batch unpacking (`async` feature)
//!
//! # Example
//!
//! ```no_run
//! use lsdreader::LsdFile;
//!
//! let dictionary = LsdFile::open("En-Ru.lsd")?;
//! println!("{}", dictionary.info().name);
//!
//! for entry in dictionary.read_headings()?.iter() {
//!     let article = dictionary.read_article(entry)?;
//!     for heading in &entry.headings {
//!         println!(
//!             "{}: {}",
//!             heading.extended_string(),
//!             String::from_utf16_lossy(&article)
//!         );
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Unpacking to DSL
//!
//! ```no_run
//! use lsdreader::{unpack_file, UnpackOptions};
//!
//! let options = UnpackOptions::new().with_output_dir("out");
//! let report = unpack_file("En-Ru.lsd", &options)?;
//! println!("{} articles", report.articles);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod common;
pub mod container;
pub mod decode;
pub mod dsl;
pub mod error;
pub mod languages;
pub mod unpack;

// Async modules (only available with async feature)
#[cfg(feature = "async")]
pub mod async_batch;

// Re-export commonly used types
pub use common::{bit_length, is_ciphered, DecoderKind, LsdError, Result, LSD_MAGIC, PAGE_SIZE};
pub use container::{DictionaryInfo, Header, LsdFile};
pub use decode::{
    ArticleEntry, BitReader, DictionaryDecoder, Heading, HeadingRegistry, HuffmanTable,
    StreamCipher,
};
pub use dsl::DslWriter;
pub use unpack::{unpack_file, UnpackOptions, UnpackReport};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
pub use async_batch::AsyncBatchProcessor;

// Convenience functions

/// Decode every heading and article of an LSD file image
///
/// # Arguments
/// * `data` - The complete file contents
///
/// # Returns
/// Each article entry paired with its decoded body, in page order
pub fn decode_bytes(data: Vec<u8>) -> Result<Vec<(ArticleEntry, Vec<u16>)>> {
    LsdFile::from_bytes(data)?.parse()
}

/// Decipher one section of an x6 system dictionary
///
/// # Arguments
/// * `data` - The ciphered bytes of one section
///
/// # Returns
/// The plain bytes; the key starts from the fixed seed for every call
pub fn decipher(data: &[u8]) -> Vec<u8> {
    decode::decode_range(data)
}
