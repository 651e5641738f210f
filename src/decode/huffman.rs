//! Huffman length tables
//!
//! A table arrives as an explicit list of `(symbol index, code length)` pairs
//! in arbitrary order. Codes are not canonical: each symbol is placed by a
//! depth-first walk that prefers the left child and backtracks into the right
//! child only when the left subtree has no free slot at the requested depth.
//! The resulting tree fixes which bit pattern maps to which symbol, so the
//! placement order is part of the format.
//!
//! Nodes live in a flat arena of `count - 1` entries. Children are allocated
//! from the front of the arena and the root occupies its last slot.

use super::bitstream::BitReader;
use crate::common::bit_length;
use crate::{LsdError, Result};
use log::trace;

/// Child slot of an internal node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Node(usize),
    Leaf(u32),
}

#[derive(Debug, Clone)]
struct HuffmanNode {
    left: Slot,
    right: Slot,
    parent: Option<usize>,
}

impl HuffmanNode {
    fn new(parent: Option<usize>) -> Self {
        Self {
            left: Slot::Empty,
            right: Slot::Empty,
            parent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Left,
    Right,
    Exhausted,
}

/// Decoding tree built from a length table
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    count: u32,
    bits_per_length: u32,
    nodes: Vec<HuffmanNode>,
    next_node: usize,
    symbol_nodes: Vec<Option<usize>>,
}

impl HuffmanTable {
    /// Read a table from the bit stream
    ///
    /// Layout: `count` (32 bits), `bits_per_length` (8 bits), then `count`
    /// pairs of symbol index (`bit_length(count)` bits) and code length
    /// (`bits_per_length` bits).
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let count = reader.read_bits(32)?;
        let bits_per_length = reader.read_bits(8)?;
        let index_bits = bit_length(count);
        reader.ensure_bits(count as u64 * (index_bits + bits_per_length) as u64)?;

        let mut table = Self::with_capacity(count, bits_per_length)?;
        for _ in 0..count {
            let symbol = reader.read_bits(index_bits)?;
            let length = reader.read_bits(bits_per_length)?;
            table.insert(symbol, length)?;
        }

        trace!(
            "Huffman table: {} symbols, {} bits per length",
            count,
            bits_per_length
        );
        Ok(table)
    }

    /// Build a table from explicit `(symbol index, code length)` pairs
    pub fn from_lengths(pairs: &[(u32, u32)]) -> Result<Self> {
        let count = u32::try_from(pairs.len()).map_err(|_| {
            LsdError::CorruptHuffmanTree(format!("{} symbols do not fit a table", pairs.len()))
        })?;
        let max_length = pairs.iter().map(|&(_, length)| length).max().unwrap_or(0);
        let mut table = Self::with_capacity(count, bit_length(max_length))?;
        for &(symbol, length) in pairs {
            table.insert(symbol, length)?;
        }
        Ok(table)
    }

    fn with_capacity(count: u32, bits_per_length: u32) -> Result<Self> {
        if count < 2 {
            return Err(LsdError::CorruptHuffmanTree(format!(
                "table needs at least two symbols, got {count}"
            )));
        }

        let node_count = count as usize - 1;
        Ok(Self {
            count,
            bits_per_length,
            nodes: vec![HuffmanNode::new(None); node_count],
            next_node: 0,
            symbol_nodes: vec![None; count as usize],
        })
    }

    /// Number of symbols in the table
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Field width of each code length in the stream
    pub fn bits_per_length(&self) -> u32 {
        self.bits_per_length
    }

    /// Field width of each symbol index in the stream
    pub fn index_bits(&self) -> u32 {
        bit_length(self.count)
    }

    fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Place one symbol at the given code length
    fn insert(&mut self, symbol: u32, length: u32) -> Result<()> {
        if symbol >= self.count {
            return Err(LsdError::SymbolOutOfRange {
                value: symbol,
                limit: self.count,
            });
        }
        // A full tree with `count` leaves is at most `count - 1` deep
        if length == 0 || length >= self.count {
            return Err(LsdError::CorruptHuffmanTree(format!(
                "symbol {symbol} has impossible code length {length}"
            )));
        }

        if self.place(symbol, length)? {
            Ok(())
        } else {
            Err(LsdError::CorruptHuffmanTree(format!(
                "no free slot for symbol {symbol} at length {length}"
            )))
        }
    }

    /// Left-preferred, backtracking placement with an explicit stack
    fn place(&mut self, symbol: u32, length: u32) -> Result<bool> {
        let mut stack = vec![(self.root(), length, Stage::Left)];

        while let Some(&(node, remaining, stage)) = stack.last() {
            if remaining == 1 {
                if self.nodes[node].left == Slot::Empty {
                    self.nodes[node].left = Slot::Leaf(symbol);
                } else if self.nodes[node].right == Slot::Empty {
                    self.nodes[node].right = Slot::Leaf(symbol);
                } else {
                    stack.pop();
                    continue;
                }
                self.symbol_nodes[symbol as usize] = Some(node);
                return Ok(true);
            }

            let top = stack.len() - 1;
            let child = match stage {
                Stage::Left => {
                    stack[top].2 = Stage::Right;
                    if self.nodes[node].left == Slot::Empty {
                        self.nodes[node].left = Slot::Node(self.allocate(node)?);
                    }
                    self.nodes[node].left
                }
                Stage::Right => {
                    stack[top].2 = Stage::Exhausted;
                    if self.nodes[node].right == Slot::Empty {
                        self.nodes[node].right = Slot::Node(self.allocate(node)?);
                    }
                    self.nodes[node].right
                }
                Stage::Exhausted => {
                    stack.pop();
                    continue;
                }
            };

            if let Slot::Node(child) = child {
                stack.push((child, remaining - 1, Stage::Left));
            }
        }

        Ok(false)
    }

    fn allocate(&mut self, parent: usize) -> Result<usize> {
        if self.next_node >= self.root() {
            return Err(LsdError::CorruptHuffmanTree(format!(
                "more than {} internal nodes required",
                self.nodes.len()
            )));
        }
        let index = self.next_node;
        self.nodes[index].parent = Some(parent);
        self.next_node += 1;
        Ok(index)
    }

    /// Decode one symbol index, one bit at a time from the root
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u32> {
        let mut node = self.root();
        loop {
            let slot = if reader.read_bit()? == 1 {
                self.nodes[node].right
            } else {
                self.nodes[node].left
            };

            match slot {
                Slot::Leaf(symbol) => return Ok(symbol),
                Slot::Node(child) => node = child,
                Slot::Empty => {
                    return Err(LsdError::CorruptHuffmanTree(format!(
                        "decode reached an empty slot under node {node}"
                    )))
                }
            }
        }
    }

    /// Bit pattern assigned to `symbol`, root first
    pub fn code_of(&self, symbol: u32) -> Option<Vec<u8>> {
        let mut node = (*self.symbol_nodes.get(symbol as usize)?)?;
        let leaf = Slot::Leaf(symbol);
        let mut bits = vec![if self.nodes[node].right == leaf { 1 } else { 0 }];

        while let Some(parent) = self.nodes[node].parent {
            let bit = if self.nodes[parent].right == Slot::Node(node) {
                1
            } else {
                0
            };
            bits.push(bit);
            node = parent;
        }

        bits.reverse();
        Some(bits)
    }

    #[cfg(test)]
    fn max_code_length(&self) -> usize {
        (0..self.count)
            .filter_map(|symbol| self.code_of(symbol))
            .map(|code| code.len())
            .max()
            .unwrap_or(0)
    }
}
