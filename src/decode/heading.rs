//! Heading records and the reference-keyed heading registry
//!
//! A heading is stored as the plain text a user types into a lookup box plus
//! a list of extension runs: formatting characters that were stripped from
//! the displayed form (optional parts in braces, escaped backslashes).
//! Rendering splices them back in.

use super::bitstream::BitReader;
use super::dictionary::DictionaryDecoder;
use crate::{LsdError, Result};
use std::collections::HashMap;

const BACKSLASH: u16 = b'\\' as u16;
const OPEN_BRACE: u16 = b'{' as u16;
const CLOSE_BRACE: u16 = b'}' as u16;

/// Run of formatting characters removed from a heading at `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Position in the plain text
    pub index: usize,
    /// Removed characters
    pub text: Vec<u16>,
}

/// One decoded heading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heading {
    /// Displayed text
    pub text: Vec<u16>,
    /// Formatting runs in splice order
    pub extensions: Vec<Extension>,
}

impl Heading {
    /// Plain heading text
    pub fn text_string(&self) -> String {
        String::from_utf16_lossy(&self.text)
    }

    /// Heading text with its extension runs spliced back in
    ///
    /// A lone backslash is inserted as is. Any other run is wrapped in
    /// braces, which shifts every later insertion point by two.
    pub fn extended_text(&self) -> Vec<u16> {
        let mut text = self.text.clone();
        let mut offset = 0;

        for extension in &self.extensions {
            let at = (extension.index + offset).min(text.len());
            if extension.text == [BACKSLASH] {
                text.insert(at, BACKSLASH);
            } else {
                let wrapped = std::iter::once(OPEN_BRACE)
                    .chain(extension.text.iter().copied())
                    .chain(std::iter::once(CLOSE_BRACE));
                text.splice(at..at, wrapped);
                offset += 2;
            }
        }

        text
    }

    /// [`Heading::extended_text`] as a `String`
    pub fn extended_string(&self) -> String {
        String::from_utf16_lossy(&self.extended_text())
    }
}

/// Read one heading record at the reader's position
///
/// `known_prefix` is the text of the previous heading on the same page.
/// Returns the heading and its article reference.
pub fn read_heading(
    decoder: &DictionaryDecoder,
    reader: &mut BitReader<'_>,
    known_prefix: &[u16],
) -> Result<(Heading, u32)> {
    let prefix_len = decoder.decode_prefix_len(reader)?;
    let postfix_len = decoder.decode_postfix_len(reader)?;

    let shared = known_prefix
        .get(..prefix_len)
        .ok_or(LsdError::InvalidBackReference {
            start: 0,
            length: prefix_len,
            available: known_prefix.len(),
        })?;
    let mut text = shared.to_vec();
    text.extend(decoder.decode_heading(reader, postfix_len)?);

    let reference = decoder.read_heading_reference(reader)?;

    let mut extensions = Vec::new();
    if reader.read_bit()? == 1 {
        let count = reader.read_bits(8)?;
        let mut current: Option<(usize, usize, Vec<u16>)> = None;

        for _ in 0..count {
            let index = reader.read_bits(8)? as usize;
            let unit = reader.read_bits(16)? as u16;

            current = match current.take() {
                Some((first, last, mut run)) if last + 1 == index => {
                    run.push(unit);
                    Some((first, index, run))
                }
                Some((first, _, run)) => {
                    extensions.push(Extension { index: first, text: run });
                    Some((index, index, vec![unit]))
                }
                None => Some((index, index, vec![unit])),
            };
        }

        if let Some((first, _, run)) = current {
            extensions.push(Extension { index: first, text: run });
        }
    }

    Ok((Heading { text, extensions }, reference))
}

/// Headings that share one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    /// Headings in arrival order
    pub headings: Vec<Heading>,
    /// Article offset relative to the articles region
    pub reference: u32,
    /// Reference of the entry that follows; bounds this article's bytes
    pub next_reference: u32,
}

impl ArticleEntry {
    /// Whether the article has exactly one heading
    pub fn is_simple(&self) -> bool {
        self.headings.len() == 1
    }

    /// First heading of the entry, `None` for an entry built without any
    pub fn first(&self) -> Option<&Heading> {
        self.headings.first()
    }

    /// Article byte length implied by the neighbouring reference
    pub fn byte_len(&self) -> u32 {
        self.next_reference.saturating_sub(self.reference)
    }
}

/// Append-only list of article entries, merged by reference
#[derive(Debug, Clone, Default)]
pub struct HeadingRegistry {
    entries: Vec<ArticleEntry>,
    by_reference: HashMap<u32, usize>,
    appended: usize,
}

impl HeadingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a heading; homographs join the entry already holding `reference`
    pub fn append(&mut self, heading: Heading, reference: u32) {
        self.appended += 1;

        if let Some(&position) = self.by_reference.get(&reference) {
            self.entries[position].headings.push(heading);
            return;
        }

        if let Some(last) = self.entries.last_mut() {
            last.next_reference = reference;
        }
        self.by_reference.insert(reference, self.entries.len());
        self.entries.push(ArticleEntry {
            headings: vec![heading],
            reference,
            next_reference: 0,
        });
    }

    /// Close the last entry's byte range
    pub fn finish(&mut self, last_next_reference: u32) {
        if let Some(last) = self.entries.last_mut() {
            last.next_reference = last_next_reference;
        }
    }

    /// Number of heading records appended, merged or not
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no heading was appended
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in page order
    pub fn entries(&self) -> &[ArticleEntry] {
        &self.entries
    }

    /// Iterate entries in page order
    pub fn iter(&self) -> std::slice::Iter<'_, ArticleEntry> {
        self.entries.iter()
    }

    /// Entry holding `reference`, if any
    pub fn get(&self, reference: u32) -> Option<&ArticleEntry> {
        self.by_reference
            .get(&reference)
            .map(|&position| &self.entries[position])
    }
}

impl<'a> IntoIterator for &'a HeadingRegistry {
    type Item = &'a ArticleEntry;
    type IntoIter = std::slice::Iter<'a, ArticleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
