//! Page headers of the heading B-tree

use crate::common::PAGE_SIZE;
use crate::decode::BitReader;
use crate::Result;

/// Bit-packed header at the start of every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Leaf pages hold heading records; inner pages only index them
    pub is_leaf: bool,
    /// Page number
    pub number: u16,
    /// Previous sibling
    pub prev: u16,
    /// Parent page
    pub parent: u16,
    /// Next sibling
    pub next: u16,
    /// Heading records on this page
    pub headings_count: u16,
}

impl PageHeader {
    /// Read a page header and leave the reader on the next byte boundary
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let header = Self {
            is_leaf: reader.read_bit()? == 1,
            number: reader.read_bits(16)? as u16,
            prev: reader.read_bits(16)? as u16,
            parent: reader.read_bits(16)? as u16,
            next: reader.read_bits(16)? as u16,
            headings_count: reader.read_bits(16)? as u16,
        };
        reader.align_to_byte();
        Ok(header)
    }
}

/// Absolute offset of page `index`
pub fn page_offset(pages_offset: u32, index: usize) -> usize {
    pages_offset as usize + PAGE_SIZE * index
}

/// Number of whole pages between the pages region start and its end
pub fn pages_count(pages_offset: u32, pages_end: u32) -> usize {
    pages_end.saturating_sub(pages_offset) as usize / PAGE_SIZE
}
