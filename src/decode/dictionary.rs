//! Dictionary decoders
//!
//! All four variants share one state layout and one set of operations; they
//! differ in the order of the length tables, in the XOR masks applied to
//! abbreviation tables, and in how article symbol values split into
//! literals and back-references. The variant is fixed at construction.

use super::bitstream::BitReader;
use super::huffman::HuffmanTable;
use crate::common::{bit_length, ABBREVIATION_PREFIX_MASK, ABBREVIATION_SYMBOL_MASK};
use crate::{DecoderKind, LsdError, Result};
use log::debug;

/// Largest value a heading symbol may resolve to
pub const MAX_HEADING_CHAR: u32 = 0xFFFF;

/// What one article symbol value stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleSymbol {
    /// Emit one UTF-16 unit
    Literal(u32),
    /// Copy this many units from the shared prefix block
    PrefixCopy(usize),
    /// Copy this many units from the article decoded so far
    SelfCopy(usize),
}

impl DecoderKind {
    /// Classify an article symbol value by this variant's thresholds
    pub fn classify(&self, symbol: u32) -> ArticleSymbol {
        match self {
            DecoderKind::SystemV13 => match symbol {
                0..=0x3F => ArticleSymbol::PrefixCopy(symbol as usize + 3),
                0x40..=0x80 => ArticleSymbol::SelfCopy(symbol as usize - 0x3D),
                _ => ArticleSymbol::Literal(symbol - 0x80),
            },
            DecoderKind::User | DecoderKind::SystemV14 | DecoderKind::Abbreviation => {
                match symbol {
                    0..=0xFFFF => ArticleSymbol::Literal(symbol),
                    0x10000..=0x1003F => ArticleSymbol::PrefixCopy(symbol as usize - 0xFFFD),
                    _ => ArticleSymbol::SelfCopy(symbol as usize - 0x1003D),
                }
            }
        }
    }

    /// Whether the postfix-length table precedes a filler word and the
    /// prefix-length table
    fn postfix_table_first(&self) -> bool {
        matches!(self, DecoderKind::SystemV13 | DecoderKind::SystemV14)
    }
}

/// Decoder tables of one dictionary, immutable once read
#[derive(Debug, Clone)]
pub struct DictionaryDecoder {
    kind: DecoderKind,
    prefix: Vec<u16>,
    article_symbols: Vec<u32>,
    heading_symbols: Vec<u32>,
    articles: HuffmanTable,
    headings: HuffmanTable,
    prefix_lengths: HuffmanTable,
    postfix_lengths: HuffmanTable,
    ref1_range: u32,
    ref2_range: u32,
}

impl DictionaryDecoder {
    /// Read the decoder tables for `kind` starting at the reader's position
    pub fn read(kind: DecoderKind, reader: &mut BitReader<'_>) -> Result<Self> {
        let prefix_len = reader.read_u32()? as usize;
        reader.ensure_bits(prefix_len as u64 * 16)?;

        let (prefix, article_symbols, heading_symbols) = if kind == DecoderKind::Abbreviation {
            let prefix = (0..prefix_len)
                .map(|_| Ok(reader.read_bits(16)? as u16 ^ ABBREVIATION_PREFIX_MASK))
                .collect::<Result<Vec<u16>>>()?;
            let article_symbols = read_masked_symbols(reader)?;
            let heading_symbols = read_masked_symbols(reader)?;
            (prefix, article_symbols, heading_symbols)
        } else {
            let prefix = reader.read_utf16_be(prefix_len)?;
            let article_symbols = reader.read_symbols()?;
            let heading_symbols = reader.read_symbols()?;
            (prefix, article_symbols, heading_symbols)
        };

        let articles = HuffmanTable::read(reader)?;
        let headings = HuffmanTable::read(reader)?;
        let (prefix_lengths, postfix_lengths) = if kind.postfix_table_first() {
            let postfix_lengths = HuffmanTable::read(reader)?;
            let _filler = reader.read_bits(32)?;
            let prefix_lengths = HuffmanTable::read(reader)?;
            (prefix_lengths, postfix_lengths)
        } else {
            let prefix_lengths = HuffmanTable::read(reader)?;
            let postfix_lengths = HuffmanTable::read(reader)?;
            (prefix_lengths, postfix_lengths)
        };

        let ref1_range = reader.read_bits(32)?;
        let ref2_range = reader.read_bits(32)?;

        debug!(
            "{}: prefix {} units, {} article symbols, {} heading symbols",
            kind.name(),
            prefix.len(),
            article_symbols.len(),
            heading_symbols.len()
        );

        Ok(Self {
            kind,
            prefix,
            article_symbols,
            heading_symbols,
            articles,
            headings,
            prefix_lengths,
            postfix_lengths,
            ref1_range,
            ref2_range,
        })
    }

    /// Variant of this decoder
    pub fn kind(&self) -> DecoderKind {
        self.kind
    }

    /// Shared prefix block
    pub fn prefix(&self) -> &[u16] {
        &self.prefix
    }

    /// Article symbol table
    pub fn article_symbols(&self) -> &[u32] {
        &self.article_symbols
    }

    /// Heading symbol table
    pub fn heading_symbols(&self) -> &[u32] {
        &self.heading_symbols
    }

    /// Huffman tables in stream-independent order: articles, headings,
    /// prefix lengths, postfix lengths
    pub fn tables(&self) -> [(&'static str, &HuffmanTable); 4] {
        [
            ("Articles", &self.articles),
            ("Headings", &self.headings),
            ("PrefixLengths", &self.prefix_lengths),
            ("PostfixLengths", &self.postfix_lengths),
        ]
    }

    /// Range sizing the first reference field
    pub fn ref1_range(&self) -> u32 {
        self.ref1_range
    }

    /// Range sizing the heading reference field
    pub fn ref2_range(&self) -> u32 {
        self.ref2_range
    }

    /// Decode the number of units a heading shares with its predecessor
    pub fn decode_prefix_len(&self, reader: &mut BitReader<'_>) -> Result<usize> {
        Ok(self.prefix_lengths.decode(reader)? as usize)
    }

    /// Decode the number of units a heading adds after the shared part
    pub fn decode_postfix_len(&self, reader: &mut BitReader<'_>) -> Result<usize> {
        Ok(self.postfix_lengths.decode(reader)? as usize)
    }

    /// Read a reference sized by `range`
    ///
    /// A 2-bit code of `3` escapes to a raw 32-bit value. Any other code
    /// supplies the top two bits of a `bit_length(range)`-bit value.
    pub fn read_reference(&self, reader: &mut BitReader<'_>, range: u32) -> Result<u32> {
        let code = reader.read_bits(2)?;
        if code == 3 {
            return reader.read_bits(32);
        }

        let size = bit_length(range);
        if size < 2 {
            return Err(LsdError::AssertionFailed(format!(
                "reference range {range} is narrower than two bits"
            )));
        }
        Ok((code << (size - 2)) | reader.read_bits(size - 2)?)
    }

    /// Read the article reference that ends a heading record
    pub fn read_heading_reference(&self, reader: &mut BitReader<'_>) -> Result<u32> {
        self.read_reference(reader, self.ref2_range)
    }

    /// Decode `length` heading units
    pub fn decode_heading(&self, reader: &mut BitReader<'_>, length: usize) -> Result<Vec<u16>> {
        let mut text = Vec::with_capacity(length);
        for _ in 0..length {
            let index = self.headings.decode(reader)?;
            let symbol = lookup(&self.heading_symbols, index)?;
            if symbol > MAX_HEADING_CHAR {
                return Err(LsdError::SymbolOutOfRange {
                    value: symbol,
                    limit: MAX_HEADING_CHAR,
                });
            }
            text.push(symbol as u16);
        }
        Ok(text)
    }

    /// Decode article symbols until at least `target_length` units exist
    pub fn decode_article(
        &self,
        reader: &mut BitReader<'_>,
        target_length: usize,
    ) -> Result<Vec<u16>> {
        let capacity = target_length.min(reader.remaining_bits() as usize);
        let mut text: Vec<u16> = Vec::with_capacity(capacity);

        while text.len() < target_length {
            let index = self.articles.decode(reader)?;
            let symbol = lookup(&self.article_symbols, index)?;

            match self.kind.classify(symbol) {
                ArticleSymbol::Literal(unit) => {
                    if unit > MAX_HEADING_CHAR {
                        return Err(LsdError::SymbolOutOfRange {
                            value: unit,
                            limit: MAX_HEADING_CHAR,
                        });
                    }
                    text.push(unit as u16);
                }
                ArticleSymbol::PrefixCopy(length) => {
                    let start =
                        reader.read_bits(bit_length(self.prefix.len() as u32))? as usize;
                    let source = start
                        .checked_add(length)
                        .and_then(|end| self.prefix.get(start..end))
                        .ok_or(LsdError::InvalidBackReference {
                            start,
                            length,
                            available: self.prefix.len(),
                        })?;
                    text.extend_from_slice(source);
                }
                ArticleSymbol::SelfCopy(length) => {
                    let start = reader.read_bits(bit_length(target_length as u32))? as usize;
                    if start >= text.len() || length > target_length {
                        return Err(LsdError::InvalidBackReference {
                            start,
                            length,
                            available: text.len(),
                        });
                    }
                    // Forward copy: the source may run into units written here
                    for offset in 0..length {
                        let unit = text[start + offset];
                        text.push(unit);
                    }
                }
            }
        }

        Ok(text)
    }
}

fn lookup(symbols: &[u32], index: u32) -> Result<u32> {
    symbols
        .get(index as usize)
        .copied()
        .ok_or(LsdError::SymbolOutOfRange {
            value: index,
            limit: symbols.len() as u32,
        })
}

fn read_masked_symbols(reader: &mut BitReader<'_>) -> Result<Vec<u32>> {
    Ok(reader
        .read_symbols()?
        .into_iter()
        .map(|symbol| symbol ^ ABBREVIATION_SYMBOL_MASK)
        .collect())
}
