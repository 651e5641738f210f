//! DSL markup output
//!
//! DSL source files are UTF-16LE with a byte order mark. A header block names
//! the dictionary and its languages; then every article is written as its
//! heading lines followed by the body indented with a tab.

use crate::decode::ArticleEntry;
use crate::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

const BOM: u16 = 0xFEFF;
const NEWLINE: u16 = b'\n' as u16;
const TAB: u16 = b'\t' as u16;

/// Writes UTF-16LE text with a leading byte order mark
#[derive(Debug)]
pub struct Utf16Writer<W: Write> {
    inner: W,
}

impl<W: Write> Utf16Writer<W> {
    /// Wrap `inner` and emit the byte order mark
    pub fn new(mut inner: W) -> Result<Self> {
        inner.write_u16::<LittleEndian>(BOM)?;
        Ok(Self { inner })
    }

    /// Write UTF-16 code units
    pub fn write_units(&mut self, units: &[u16]) -> Result<()> {
        for &unit in units {
            self.inner.write_u16::<LittleEndian>(unit)?;
        }
        Ok(())
    }

    /// Write a Rust string
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        for unit in text.encode_utf16() {
            self.inner.write_u16::<LittleEndian>(unit)?;
        }
        Ok(())
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Header block of a DSL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DslHeader<'a> {
    /// Dictionary title
    pub name: &'a str,
    /// DSL name of the heading language
    pub index_language: &'a str,
    /// DSL name of the article language
    pub contents_language: &'a str,
    /// File name of the companion icon, if any
    pub icon_file: Option<&'a str>,
}

/// Streaming DSL writer
#[derive(Debug)]
pub struct DslWriter<W: Write> {
    out: Utf16Writer<W>,
}

impl<W: Write> DslWriter<W> {
    /// Start a DSL file by writing its header block
    pub fn new(inner: W, header: &DslHeader<'_>) -> Result<Self> {
        let mut out = Utf16Writer::new(inner)?;
        out.write_str(&format!("#NAME\t\"{}\"\n", header.name))?;
        out.write_str(&format!("#INDEX_LANGUAGE\t\"{}\"\n", header.index_language))?;
        out.write_str(&format!(
            "#CONTENTS_LANGUAGE\t\"{}\"\n",
            header.contents_language
        ))?;
        if let Some(icon) = header.icon_file {
            out.write_str(&format!("#ICON_FILE\t\"{icon}\"\n"))?;
        }
        out.write_str("\n")?;
        Ok(Self { out })
    }

    /// Write one entry: its headings, then the tab-indented article
    pub fn write_entry(&mut self, entry: &ArticleEntry, article: &[u16]) -> Result<()> {
        match entry.headings.as_slice() {
            [heading] => {
                self.out.write_units(&heading.extended_text())?;
                self.out.write_units(&[NEWLINE, TAB])?;
            }
            headings => {
                for heading in headings {
                    self.out.write_units(&heading.extended_text())?;
                    self.out.write_units(&[NEWLINE])?;
                }
                self.out.write_units(&[TAB])?;
            }
        }
        self.out.write_units(&indent_article(article))?;
        self.out.write_units(&[NEWLINE])
    }

    /// Flush and return the inner writer
    pub fn finish(self) -> Result<W> {
        self.out.finish()
    }
}

/// Insert a tab after every newline so continuation lines stay in the body
pub fn indent_article(article: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(article.len());
    for &unit in article {
        out.push(unit);
        if unit == NEWLINE {
            out.push(TAB);
        }
    }
    out
}
