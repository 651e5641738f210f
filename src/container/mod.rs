//! LSD container: header, decoder tables, pages and articles
//!
//! [`LsdFile`] owns the whole file image. The image is never modified;
//! ciphered sections are deciphered into owned copies as they are read.
//!
//! # Layout
//!
//! ```text
//! +--------+------+------------+----------------+----------+-------+---------+
//! | header | info | annotation | decoder tables | articles | pages | overlay |
//! +--------+------+------------+----------------+----------+-------+---------+
//! ```

pub mod header;
pub mod page;

pub use header::{DictionaryInfo, Header, CHECKSUM_VERSION, HEADER_SIZE};
pub use page::PageHeader;

use crate::common::{is_ciphered, ARTICLE_SIZE_ESCAPE};
use crate::decode::{
    decode_range, read_heading, ArticleEntry, BitReader, DictionaryDecoder, HeadingRegistry,
};
use crate::{DecoderKind, LsdError, Result};
use log::{debug, info, trace};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// A loaded LSD dictionary
#[derive(Debug, Clone)]
pub struct LsdFile {
    data: Vec<u8>,
    header: Header,
    info: DictionaryInfo,
    decoder: DictionaryDecoder,
    overlay_entries: u32,
}

impl LsdFile {
    /// Read and parse a dictionary file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening {}", path.display());
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Parse a dictionary from its file image
    ///
    /// Reads the header, the info block, the overlay entry count and the
    /// decoder tables. Headings and articles are decoded on demand.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut reader = BitReader::new(&data);
        let header = Header::read(&mut reader)?;
        let kind = DecoderKind::from_version(header.version)?;
        info!(
            "Version {:#x}, {} entries, {}",
            header.version,
            header.entries_count,
            kind.name()
        );

        let info = DictionaryInfo::read(&mut reader, header.version, data.len())?;

        let overlay_entries = if reader.seek(info.overlay_offset as usize) {
            reader.read_bits(4)?
        } else {
            0
        };

        let tables = section(
            &data,
            header.dictionary_encoder_offset as usize,
            header.articles_offset as usize,
            is_ciphered(header.version),
        )?;
        let decoder = DictionaryDecoder::read(kind, &mut BitReader::new(&tables))?;

        Ok(Self {
            data,
            header,
            info,
            decoder,
            overlay_entries,
        })
    }

    /// File header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Dictionary info block
    pub fn info(&self) -> &DictionaryInfo {
        &self.info
    }

    /// Decoder tables
    pub fn decoder(&self) -> &DictionaryDecoder {
        &self.decoder
    }

    /// Whether sections of this file are ciphered
    pub fn is_ciphered(&self) -> bool {
        is_ciphered(self.header.version)
    }

    /// Entry count read from the overlay block, zero when there is none
    pub fn overlay_entries(&self) -> u32 {
        self.overlay_entries
    }

    /// Number of pages in the pages region
    pub fn pages_count(&self) -> usize {
        page::pages_count(self.header.pages_offset, self.info.pages_end)
    }

    /// Decode every heading from the leaf pages
    ///
    /// Fails with [`LsdError::EntryCountMismatch`] when the pages yield a
    /// different number of records than the header declares.
    pub fn read_headings(&self) -> Result<HeadingRegistry> {
        let mut registry = HeadingRegistry::new();
        let mut reader = BitReader::new(&self.data);
        let pages = self.pages_count();
        debug!("Reading headings from {pages} pages");

        for index in 0..pages {
            reader.seek(page::page_offset(self.header.pages_offset, index));
            let page = PageHeader::read(&mut reader)?;
            trace!(
                "Page {index}: leaf {}, {} headings",
                page.is_leaf,
                page.headings_count
            );
            if !page.is_leaf {
                continue;
            }

            let mut known_prefix = Vec::new();
            for _ in 0..page.headings_count {
                let (heading, reference) =
                    read_heading(&self.decoder, &mut reader, &known_prefix)?;
                known_prefix = heading.text.clone();
                registry.append(heading, reference);
            }
        }

        registry.finish(
            self.header
                .pages_offset
                .saturating_sub(self.header.articles_offset),
        );

        let found = registry.appended() as u32;
        if found != self.header.entries_count {
            return Err(LsdError::EntryCountMismatch {
                expected: self.header.entries_count,
                found,
            });
        }

        info!(
            "Decoded {} headings into {} articles",
            registry.appended(),
            registry.len()
        );
        Ok(registry)
    }

    /// Decode the article of one registry entry
    pub fn read_article(&self, entry: &ArticleEntry) -> Result<Vec<u16>> {
        let start = self.header.articles_offset as usize + entry.reference as usize;
        let end = self.header.articles_offset as usize + entry.next_reference as usize;
        let bytes = section(&self.data, start, end, self.is_ciphered())?;

        let mut reader = BitReader::new(&bytes);
        let mut size = reader.read_bits(16)?;
        if size == ARTICLE_SIZE_ESCAPE {
            size = reader.read_bits(32)?;
        }
        trace!("Article at {:#x}: {size} units", entry.reference);
        self.decoder.decode_article(&mut reader, size as usize)
    }

    /// Decode the dictionary annotation, empty when the file has none
    pub fn read_annotation(&self) -> Result<Vec<u16>> {
        let start = self.header.annotation_offset as usize;
        if start >= self.data.len() {
            return Ok(Vec::new());
        }

        let bytes = section(
            &self.data,
            start,
            self.header.dictionary_encoder_offset as usize,
            self.is_ciphered(),
        )?;
        let mut reader = BitReader::new(&bytes);
        let size = reader.read_bits(16)?;
        self.decoder.decode_article(&mut reader, size as usize)
    }

    /// Decode all headings and their articles
    pub fn parse(&self) -> Result<Vec<(ArticleEntry, Vec<u16>)>> {
        let registry = self.read_headings()?;
        registry
            .iter()
            .map(|entry| Ok((entry.clone(), self.read_article(entry)?)))
            .collect()
    }

    /// Multi-line description of header, info block and decoder tables
    pub fn dump(&self) -> FileDump<'_> {
        FileDump(self)
    }
}

/// Display adapter returned by [`LsdFile::dump`]
#[derive(Debug)]
pub struct FileDump<'a>(&'a LsdFile);

impl fmt::Display for FileDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.0;
        let info = &file.info;
        writeln!(f, "{}", file.header)?;
        writeln!(f, "Name:                        {}", info.name)?;
        writeln!(f, "First heading:               {}", info.first_heading)?;
        writeln!(f, "Last heading:                {}", info.last_heading)?;
        writeln!(f, "Capitals:                    {}", info.capitals)?;
        writeln!(f, "Pages end:                   {:#x}", info.pages_end)?;
        writeln!(f, "Overlay data:                {:#x}", info.overlay_offset)?;
        writeln!(f, "Pages count:                 {}", file.pages_count())?;
        if file.header.version > CHECKSUM_VERSION {
            writeln!(f, "Filler 1:                    {:#x}", info.fillers[0])?;
            writeln!(f, "Filler 2:                    {:#x}", info.fillers[1])?;
        }
        writeln!(f, "Icon enabled:                {}", info.has_icon())?;

        let decoder = &file.decoder;
        writeln!(f, "{}:", decoder.kind().name())?;
        writeln!(f, "    Prefix length:           {}", decoder.prefix().len())?;
        writeln!(f, "    Article symbols:         {}", decoder.article_symbols().len())?;
        writeln!(f, "    Heading symbols:         {}", decoder.heading_symbols().len())?;
        for (name, table) in decoder.tables() {
            writeln!(
                f,
                "    {:<24} count {}, bits per length {}, index bits {}",
                format!("{name}:"),
                table.count(),
                table.bits_per_length(),
                table.index_bits()
            )?;
        }
        writeln!(f, "    Ref1 range:              {:#x}", decoder.ref1_range())?;
        writeln!(f, "    Ref2 range:              {:#x}", decoder.ref2_range())?;
        writeln!(f, "Overlay:")?;
        write!(f, "    Entries count:           {}", file.overlay_entries)
    }
}

/// Bytes `[start, end)` of `data`, deciphered when `ciphered` is set
///
/// Plain sections borrow everything from `start` on so a table or text may
/// run past `end` the way the format's readers allow.
fn section(data: &[u8], start: usize, end: usize, ciphered: bool) -> Result<Cow<'_, [u8]>> {
    let out_of_bounds = || LsdError::OutOfBounds {
        offset: start,
        needed: end.saturating_sub(start),
        len: data.len(),
    };

    if ciphered {
        let bytes = data.get(start..end).ok_or_else(out_of_bounds)?;
        debug!("Deciphering [{start:#x}, {end:#x})");
        Ok(Cow::Owned(decode_range(bytes)))
    } else {
        Ok(Cow::Borrowed(data.get(start..).ok_or_else(out_of_bounds)?))
    }
}
