//! Test-only writer for synthetic LSD files
//!
//! Every Huffman table written here uses fixed-length codes over a
//! power-of-two symbol count, so symbol `i` is coded as `i` in
//! `log2(count)` bits. That keeps expected bit streams easy to reason about
//! while exercising the same reader paths as real dictionaries.

#![allow(dead_code)]

use lsdreader::decode::SBOX;
use lsdreader::{bit_length, DecoderKind};
use std::collections::BTreeSet;

/// MSB-first bit writer, the mirror of `BitReader`
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, value: u32, count: u32) {
        for shift in (0..count).rev() {
            let bit = (value >> shift) & 1;
            if self.bit_pos == 0 {
                self.bytes.push(0);
            }
            if bit == 1 {
                if let Some(last) = self.bytes.last_mut() {
                    *last |= 0x80 >> self.bit_pos;
                }
            }
            self.bit_pos = (self.bit_pos + 1) % 8;
        }
    }

    pub fn align(&mut self) {
        self.bit_pos = 0;
    }

    /// Raw big-endian 32-bit value at a byte boundary
    pub fn write_u32_raw(&mut self, value: u32) {
        self.align();
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encrypt a section the way x6 system dictionaries store it
pub fn encipher(data: &mut [u8]) {
    let mut key = 0x7Fu8;
    for byte in data.iter_mut() {
        let cipher = *byte ^ key;
        key = SBOX[cipher as usize];
        *byte = cipher;
    }
}

/// One step of an article body
#[derive(Debug, Clone)]
pub enum Op {
    Text(String),
    PrefixCopy { start: u32, len: u32 },
    SelfCopy { start: u32, len: u32 },
}

impl Op {
    pub fn text(text: &str) -> Self {
        Op::Text(text.to_string())
    }
}

/// A heading with optional `(index, unit)` extension entries
#[derive(Debug, Clone)]
pub struct FixtureHeading {
    pub text: String,
    pub extensions: Vec<(u8, char)>,
}

impl FixtureHeading {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            extensions: Vec::new(),
        }
    }

    pub fn with_extensions(text: &str, extensions: &[(u8, char)]) -> Self {
        Self {
            text: text.to_string(),
            extensions: extensions.to_vec(),
        }
    }
}

/// An article with every heading that points at it
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub headings: Vec<FixtureHeading>,
    pub body: Vec<Op>,
}

impl FixtureEntry {
    pub fn simple(heading: &str, article: &str) -> Self {
        Self {
            headings: vec![FixtureHeading::new(heading)],
            body: vec![Op::text(article)],
        }
    }
}

/// Description of a synthetic dictionary
#[derive(Debug, Clone)]
pub struct Fixture {
    pub version: u32,
    pub name: String,
    pub source_language: u16,
    pub target_language: u16,
    pub icon: Vec<u8>,
    pub prefix: String,
    pub annotation: Option<String>,
    pub entries: Vec<FixtureEntry>,
    /// Heading records per leaf page
    pub page_capacity: usize,
    /// Add an inner page before the leaf pages
    pub inner_page: bool,
    pub overlay: Option<u8>,
    /// Header entry count; defaults to the number of heading records
    pub declared_entries: Option<u32>,
}

const LENGTH_TABLE_SIZE: u32 = 32;
const REF_RANGE: u32 = 0xFFFF;
const HEADER_SIZE: usize = 52;
const PAGE_SIZE: usize = 512;

impl Fixture {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            name: "Test Dictionary".to_string(),
            source_language: 1033,
            target_language: 1049,
            icon: Vec::new(),
            prefix: String::new(),
            annotation: None,
            entries: Vec::new(),
            page_capacity: 64,
            inner_page: false,
            overlay: None,
            declared_entries: None,
        }
    }

    pub fn entry(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    fn kind(&self) -> DecoderKind {
        DecoderKind::from_version(self.version).expect("fixture version must be supported")
    }

    fn prefix_units(&self) -> Vec<u16> {
        self.prefix.encode_utf16().collect()
    }

    /// Article symbol value for each op kind
    fn literal_symbol(&self, unit: u16) -> u32 {
        match self.kind() {
            DecoderKind::SystemV13 => unit as u32 + 0x80,
            _ => unit as u32,
        }
    }

    fn prefix_copy_symbol(&self, len: u32) -> u32 {
        match self.kind() {
            DecoderKind::SystemV13 => len - 3,
            _ => len + 0xFFFD,
        }
    }

    fn self_copy_symbol(&self, len: u32) -> u32 {
        match self.kind() {
            DecoderKind::SystemV13 => len + 0x3D,
            _ => len + 0x1003D,
        }
    }

    fn article_ops(&self) -> impl Iterator<Item = &[Op]> {
        self.entries.iter().map(|entry| entry.body.as_slice())
    }

    fn article_symbol_table(&self) -> Vec<u32> {
        let mut symbols = BTreeSet::new();
        let mut add_ops = |ops: &[Op]| {
            for op in ops {
                match op {
                    Op::Text(text) => {
                        for unit in text.encode_utf16() {
                            symbols.insert(self.literal_symbol(unit));
                        }
                    }
                    Op::PrefixCopy { len, .. } => {
                        symbols.insert(self.prefix_copy_symbol(*len));
                    }
                    Op::SelfCopy { len, .. } => {
                        symbols.insert(self.self_copy_symbol(*len));
                    }
                }
            }
        };
        for ops in self.article_ops() {
            add_ops(ops);
        }
        if let Some(annotation) = &self.annotation {
            add_ops(&[Op::text(annotation)]);
        }
        pad_symbols(symbols.into_iter().collect(), self.literal_symbol(b' ' as u16))
    }

    fn heading_symbol_table(&self) -> Vec<u32> {
        let symbols: BTreeSet<u32> = self
            .entries
            .iter()
            .flat_map(|e| e.headings.iter())
            .flat_map(|h| h.text.encode_utf16())
            .map(u32::from)
            .collect();
        pad_symbols(symbols.into_iter().collect(), b' ' as u32)
    }

    /// Body length in UTF-16 units after decoding
    fn decoded_len(&self, ops: &[Op]) -> u32 {
        ops.iter()
            .map(|op| match op {
                Op::Text(text) => text.encode_utf16().count() as u32,
                Op::PrefixCopy { len, .. } | Op::SelfCopy { len, .. } => *len,
            })
            .sum()
    }

    fn write_article(&self, writer: &mut BitWriter, symbols: &[u32], ops: &[Op], escape: bool) {
        let target = self.decoded_len(ops);
        if escape {
            writer.write_bits(0xFFFF, 16);
            writer.write_bits(target, 32);
        } else {
            writer.write_bits(target, 16);
        }
        let width = code_width(symbols.len());
        let index_of = |symbol: u32| {
            symbols
                .iter()
                .position(|&s| s == symbol)
                .expect("symbol must be in table") as u32
        };

        for op in ops {
            match op {
                Op::Text(text) => {
                    for unit in text.encode_utf16() {
                        writer.write_bits(index_of(self.literal_symbol(unit)), width);
                    }
                }
                Op::PrefixCopy { start, len } => {
                    writer.write_bits(index_of(self.prefix_copy_symbol(*len)), width);
                    writer.write_bits(*start, bit_length(self.prefix_units().len() as u32));
                }
                Op::SelfCopy { start, len } => {
                    writer.write_bits(index_of(self.self_copy_symbol(*len)), width);
                    writer.write_bits(*start, bit_length(target));
                }
            }
        }
        writer.align();
    }

    fn write_tables(&self, article_symbols: &[u32], heading_symbols: &[u32]) -> Vec<u8> {
        let kind = self.kind();
        let mut writer = BitWriter::new();
        let prefix = self.prefix_units();
        writer.write_u32_raw(prefix.len() as u32);

        let (prefix_mask, symbol_mask) = if kind == DecoderKind::Abbreviation {
            (0x879A, 0x1325)
        } else {
            (0, 0)
        };
        for unit in &prefix {
            writer.write_bits((unit ^ prefix_mask) as u32, 16);
        }
        write_symbols(&mut writer, article_symbols, symbol_mask);
        write_symbols(&mut writer, heading_symbols, symbol_mask);

        write_fixed_table(&mut writer, article_symbols.len() as u32);
        write_fixed_table(&mut writer, heading_symbols.len() as u32);
        if matches!(kind, DecoderKind::SystemV13 | DecoderKind::SystemV14) {
            write_fixed_table(&mut writer, LENGTH_TABLE_SIZE);
            writer.write_bits(0xCAFE_F00D, 32);
            write_fixed_table(&mut writer, LENGTH_TABLE_SIZE);
        } else {
            write_fixed_table(&mut writer, LENGTH_TABLE_SIZE);
            write_fixed_table(&mut writer, LENGTH_TABLE_SIZE);
        }
        writer.write_bits(REF_RANGE, 32);
        writer.write_bits(REF_RANGE, 32);
        writer.into_bytes()
    }

    fn write_info(&self, out: &mut Vec<u8>, pages_end: u32, overlay_offset: u32) {
        let name: Vec<u16> = self.name.encode_utf16().collect();
        out.push(name.len() as u8);
        push_utf16le(out, &name);
        let first = self.first_heading();
        out.push(first.len() as u8);
        push_utf16le(out, &first);
        let last = self.last_heading();
        out.push(last.len() as u8);
        push_utf16le(out, &last);
        let capitals: Vec<u16> = "ABC".encode_utf16().collect();
        out.extend_from_slice(&(capitals.len() as u32).to_le_bytes());
        push_utf16le(out, &capitals);

        if self.version > 0x120000 {
            out.extend_from_slice(&(self.icon.len() as u16).to_le_bytes());
            out.extend_from_slice(&self.icon);
        }
        if self.version > 0x140000 {
            out.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        }
        if self.version > 0x120000 {
            out.extend_from_slice(&pages_end.to_le_bytes());
            out.extend_from_slice(&overlay_offset.to_le_bytes());
        }
        if self.version > 0x140000 {
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
        }
    }

    fn info_len(&self) -> usize {
        let mut probe = Vec::new();
        self.write_info(&mut probe, 0, 0);
        probe.len()
    }

    fn first_heading(&self) -> Vec<u16> {
        self.entries
            .first()
            .map(|e| e.headings[0].text.encode_utf16().collect())
            .unwrap_or_default()
    }

    fn last_heading(&self) -> Vec<u16> {
        self.entries
            .last()
            .and_then(|e| e.headings.last())
            .map(|h| h.text.encode_utf16().collect())
            .unwrap_or_default()
    }

    fn write_pages(&self, heading_symbols: &[u32], references: &[u32]) -> Vec<u8> {
        let records: Vec<(&FixtureHeading, u32)> = self
            .entries
            .iter()
            .zip(references)
            .flat_map(|(entry, &reference)| entry.headings.iter().map(move |h| (h, reference)))
            .collect();

        let mut pages = Vec::new();
        if self.inner_page {
            let mut writer = BitWriter::new();
            write_page_header(&mut writer, false, 0, 0);
            pages.push(pad_page(writer.into_bytes()));
        }

        let width = code_width(heading_symbols.len());
        for (number, chunk) in records.chunks(self.page_capacity.max(1)).enumerate() {
            let mut writer = BitWriter::new();
            write_page_header(&mut writer, true, number as u32 + 1, chunk.len() as u32);

            let mut known: Vec<u16> = Vec::new();
            for (heading, reference) in chunk {
                let text: Vec<u16> = heading.text.encode_utf16().collect();
                let shared = known
                    .iter()
                    .zip(&text)
                    .take_while(|(a, b)| a == b)
                    .count()
                    .min(LENGTH_TABLE_SIZE as usize - 1);
                let postfix = &text[shared..];
                assert!(postfix.len() < LENGTH_TABLE_SIZE as usize);

                writer.write_bits(shared as u32, 5);
                writer.write_bits(postfix.len() as u32, 5);
                for &unit in postfix {
                    let index = heading_symbols
                        .iter()
                        .position(|&s| s == unit as u32)
                        .expect("heading symbol");
                    writer.write_bits(index as u32, width);
                }
                assert!(*reference < 0xC000, "reference must fit the short form");
                writer.write_bits(*reference, 16);

                if heading.extensions.is_empty() {
                    writer.write_bits(0, 1);
                } else {
                    writer.write_bits(1, 1);
                    writer.write_bits(heading.extensions.len() as u32, 8);
                    for &(index, unit) in &heading.extensions {
                        writer.write_bits(index as u32, 8);
                        writer.write_bits(unit as u32, 16);
                    }
                }
                known = text;
            }
            pages.push(pad_page(writer.into_bytes()));
        }
        pages.concat()
    }

    /// Serialize the dictionary
    pub fn build(&self) -> Vec<u8> {
        let article_symbols = self.article_symbol_table();
        let heading_symbols = self.heading_symbol_table();
        let ciphered = self.version == 0x151005;

        let annotation = self.annotation.as_ref().map(|text| {
            let mut writer = BitWriter::new();
            self.write_article(&mut writer, &article_symbols, &[Op::text(text)], false);
            writer.into_bytes()
        });

        let tables = self.write_tables(&article_symbols, &heading_symbols);

        let mut articles: Vec<Vec<u8>> = Vec::new();
        let mut references = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            // byte offset of this article within the articles region
            references.push(articles.iter().map(Vec::len).sum::<usize>() as u32);
            let mut writer = BitWriter::new();
            // exercise the 32-bit size escape on every third article
            let escape = index % 3 == 2;
            self.write_article(&mut writer, &article_symbols, &entry.body, escape);
            let mut bytes = writer.into_bytes();
            // trailing slack between articles
            bytes.push(0);
            articles.push(bytes);
        }

        let pages = self.write_pages(&heading_symbols, &references);

        let info_len = self.info_len();
        let annotation_offset = HEADER_SIZE + info_len;
        let annotation_len = annotation.as_ref().map_or(0, Vec::len);
        let encoder_offset = annotation_offset + annotation_len;
        let articles_offset = encoder_offset + tables.len();
        let articles_len: usize = articles.iter().map(Vec::len).sum();
        let pages_offset = articles_offset + articles_len;
        let pages_end = pages_offset + pages.len();
        let overlay_offset = if self.overlay.is_some() {
            pages_end
        } else {
            pages_end + 0x100
        };

        let mut annotation_field = annotation_offset as u32;
        if annotation.is_none() {
            annotation_field = u32::MAX;
        }

        let record_count: usize = self.entries.iter().map(|e| e.headings.len()).sum();
        let mut out = b"LingVo\0\0".to_vec();
        for field in [
            self.version,
            0,
            0xABCD,
            self.declared_entries.unwrap_or(record_count as u32),
            annotation_field,
            encoder_offset as u32,
            articles_offset as u32,
            pages_offset as u32,
            0,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        for field in [0u16, 0, self.source_language, self.target_language] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        self.write_info(&mut out, pages_end as u32, overlay_offset as u32);
        assert_eq!(out.len(), annotation_offset);

        let mut annotation = annotation.unwrap_or_default();
        let mut tables = tables;
        if ciphered {
            encipher(&mut annotation);
            encipher(&mut tables);
            for article in &mut articles {
                encipher(article);
            }
        }

        out.extend(annotation);
        out.extend(tables);
        for article in articles {
            out.extend(article);
        }
        out.extend(pages);
        if let Some(overlay) = self.overlay {
            out.push(overlay);
        }
        out
    }
}

fn code_width(count: usize) -> u32 {
    bit_length(count as u32 - 1)
}

/// Pad a symbol table to a power-of-two length of at least two
fn pad_symbols(mut symbols: Vec<u32>, filler: u32) -> Vec<u32> {
    let target = symbols.len().max(2).next_power_of_two();
    while symbols.len() < target {
        symbols.push(filler);
    }
    symbols
}

fn write_symbols(writer: &mut BitWriter, symbols: &[u32], mask: u32) {
    let masked: Vec<u32> = symbols.iter().map(|s| s ^ mask).collect();
    let width = masked.iter().map(|&s| bit_length(s)).max().unwrap_or(1);
    writer.write_bits(masked.len() as u32, 32);
    writer.write_bits(width, 8);
    for symbol in masked {
        writer.write_bits(symbol, width);
    }
}

/// Huffman table where every one of `count` symbols has the same length
fn write_fixed_table(writer: &mut BitWriter, count: u32) {
    let length = bit_length(count - 1);
    writer.write_bits(count, 32);
    writer.write_bits(8, 8);
    for symbol in 0..count {
        writer.write_bits(symbol, bit_length(count));
        writer.write_bits(length, 8);
    }
}

fn write_page_header(writer: &mut BitWriter, leaf: bool, number: u32, count: u32) {
    writer.write_bits(leaf as u32, 1);
    writer.write_bits(number, 16);
    writer.write_bits(0xFFFF, 16);
    writer.write_bits(0, 16);
    writer.write_bits(0xFFFF, 16);
    writer.write_bits(count, 16);
    writer.align();
}

fn pad_page(mut bytes: Vec<u8>) -> Vec<u8> {
    assert!(bytes.len() <= PAGE_SIZE, "page overflow");
    bytes.resize(PAGE_SIZE, 0);
    bytes
}

fn push_utf16le(out: &mut Vec<u8>, units: &[u16]) {
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}
