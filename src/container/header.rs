//! Fixed file header and the dictionary info block that follows it
//!
//! Multi-byte fields are little-endian on disk. They are read with the raw
//! big-endian helpers of [`BitReader`] and byte-swapped.

use crate::common::LSD_MAGIC;
use crate::decode::BitReader;
use crate::languages::dsl_language;
use crate::{LsdError, Result};
use std::fmt;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 52;

/// Icon block present from Lingvo 12 on
const ICON_VERSION: u32 = 0x120000;
/// Header checksum and filler words present from Lingvo x5 on
pub const CHECKSUM_VERSION: u32 = 0x140000;

fn read_le16(reader: &mut BitReader<'_>) -> Result<u16> {
    Ok(reader.read_u16()?.swap_bytes())
}

fn read_le32(reader: &mut BitReader<'_>) -> Result<u32> {
    Ok(reader.read_u32()?.swap_bytes())
}

fn read_string(reader: &mut BitReader<'_>, len: usize) -> Result<String> {
    Ok(String::from_utf16_lossy(&reader.read_utf16_le(len)?))
}

/// LSD file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Identifier with NUL padding removed
    pub magic: String,
    /// Container version
    pub version: u32,
    /// Unidentified word after the version
    pub unknown: u32,
    /// Stored checksum
    pub checksum: u32,
    /// Heading records the pages must yield
    pub entries_count: u32,
    /// Start of the annotation text
    pub annotation_offset: u32,
    /// Start of the decoder tables
    pub dictionary_encoder_offset: u32,
    /// Start of the articles region; article references are relative to it
    pub articles_offset: u32,
    /// Start of the pages region
    pub pages_offset: u32,
    /// Unidentified trailing word
    pub unknown1: u32,
    /// Unidentified trailing half-word
    pub unknown2: u16,
    /// Unidentified trailing half-word
    pub unknown3: u16,
    /// Locale identifier of the headings
    pub source_language: u16,
    /// Locale identifier of the articles
    pub target_language: u16,
}

impl Header {
    /// Read the header at the reader's position and check its magic
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let magic: String = String::from_utf8_lossy(reader.read_raw(8)?)
            .chars()
            .filter(|&c| c != '\0')
            .collect();
        if magic != LSD_MAGIC {
            return Err(LsdError::MagicMismatch(magic));
        }

        Ok(Self {
            magic,
            version: read_le32(reader)?,
            unknown: read_le32(reader)?,
            checksum: read_le32(reader)?,
            entries_count: read_le32(reader)?,
            annotation_offset: read_le32(reader)?,
            dictionary_encoder_offset: read_le32(reader)?,
            articles_offset: read_le32(reader)?,
            pages_offset: read_le32(reader)?,
            unknown1: read_le32(reader)?,
            unknown2: read_le16(reader)?,
            unknown3: read_le16(reader)?,
            source_language: read_le16(reader)?,
            target_language: read_le16(reader)?,
        })
    }

    /// Parse just the header from the start of a file image
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read(&mut BitReader::new(data))
    }

    /// Major version: the top 16 bits of the version field
    pub fn hi_version(&self) -> u32 {
        self.version >> 16
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header:")?;
        writeln!(f, "    Magic:                   {}", self.magic)?;
        writeln!(f, "    Checksum:                {:#x}", self.checksum)?;
        writeln!(
            f,
            "    Version:                 {:#x} ({:#x})",
            self.hi_version(),
            self.version
        )?;
        writeln!(f, "    Entries:                 {}", self.entries_count)?;
        writeln!(f, "    AnnotationOffset:        {:#x}", self.annotation_offset)?;
        writeln!(
            f,
            "    DictionaryEncoderOffset: {:#x}",
            self.dictionary_encoder_offset
        )?;
        writeln!(f, "    ArticlesOffset:          {:#x}", self.articles_offset)?;
        writeln!(f, "    PagesOffset:             {:#x}", self.pages_offset)?;
        writeln!(
            f,
            "    Source language:         {} {}",
            self.source_language,
            dsl_language(self.source_language)
        )?;
        write!(
            f,
            "    Target language:         {} {}",
            self.target_language,
            dsl_language(self.target_language)
        )
    }
}

/// Variable-length block following the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    /// Dictionary title
    pub name: String,
    /// First heading in sort order
    pub first_heading: String,
    /// Last heading in sort order
    pub last_heading: String,
    /// Alphabet of capital letters
    pub capitals: String,
    /// Raw BMP icon, empty when absent
    pub icon: Vec<u8>,
    /// Header checksum, zero before x5
    pub header_checksum: u32,
    /// End of the pages region
    pub pages_end: u32,
    /// Start of the overlay block
    pub overlay_offset: u32,
    /// Filler words, zero before x5
    pub fillers: [u32; 2],
}

impl DictionaryInfo {
    /// Read the info block; `file_len` stands in for the page end and
    /// overlay offset of versions that do not store them
    pub fn read(reader: &mut BitReader<'_>, version: u32, file_len: usize) -> Result<Self> {
        let name_len = reader.read_u8()? as usize;
        let name = read_string(reader, name_len)?;
        let first_len = reader.read_u8()? as usize;
        let first_heading = read_string(reader, first_len)?;
        let last_len = reader.read_u8()? as usize;
        let last_heading = read_string(reader, last_len)?;
        let capitals_len = read_le32(reader)? as usize;
        reader.ensure_bits(capitals_len as u64 * 16)?;
        let capitals = read_string(reader, capitals_len)?;

        let icon = if version > ICON_VERSION {
            let icon_size = read_le16(reader)? as usize;
            reader.read_raw(icon_size)?.to_vec()
        } else {
            Vec::new()
        };

        let header_checksum = if version > CHECKSUM_VERSION {
            read_le32(reader)?
        } else {
            0
        };

        let (pages_end, overlay_offset) = if version > ICON_VERSION {
            (read_le32(reader)?, read_le32(reader)?)
        } else {
            let len = u32::try_from(file_len).unwrap_or(u32::MAX);
            (len, len)
        };

        let fillers = if version > CHECKSUM_VERSION {
            [read_le32(reader)?, read_le32(reader)?]
        } else {
            [0, 0]
        };

        Ok(Self {
            name,
            first_heading,
            last_heading,
            capitals,
            icon,
            header_checksum,
            pages_end,
            overlay_offset,
            fillers,
        })
    }

    /// Whether an icon is stored
    pub fn has_icon(&self) -> bool {
        !self.icon.is_empty()
    }
}
