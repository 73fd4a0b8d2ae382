use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::proto::osmformat::StringTable as PbfStringTable;

/// Per-block string pool.
///
/// Index `0` is a sentinel: it is stored as an empty string so the table
/// serializes the way the format expects, but [`StringTable::intern`] never
/// hands it out. Indices `1..=N` are assigned in first-seen order.
///
/// A table lives exactly as long as one block's encode or decode pass and is
/// never shared between blocks.
#[derive(Clone, Debug)]
pub struct StringTable {
    strings: Vec<Vec<u8>>,
    indices: HashMap<Vec<u8>, u32>,
    indexed: bool,
    byte_size: usize,
}

impl Default for StringTable {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: vec![Vec::new()],
            indices: HashMap::new(),
            indexed: true,
            byte_size: 0,
        }
    }

    /// Takes over the table of a decoded block. Entry `0` is kept as written.
    ///
    /// Entries stay raw bytes; they are checked for UTF-8 only when resolved.
    pub(crate) fn from_pbf(pbf: PbfStringTable) -> Self {
        let mut strings = pbf.s;
        if strings.is_empty() {
            strings.push(Vec::new());
        }
        let byte_size = strings[1..].iter().map(Vec::len).sum();
        Self {
            strings,
            // built on demand by `intern`
            indices: HashMap::new(),
            indexed: false,
            byte_size,
        }
    }

    /// Returns the index of `s`, adding it to the table if it was not seen
    /// before. The returned index is never `0`.
    pub fn intern(&mut self, s: &str) -> u32 {
        if !self.indexed {
            self.rebuild_indices();
        }
        if let Some(&index) = self.indices.get(s.as_bytes()) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(s.as_bytes().to_vec());
        self.indices.insert(s.as_bytes().to_vec(), index);
        self.byte_size += s.len();
        index
    }

    fn rebuild_indices(&mut self) {
        self.indices.clear();
        for (i, s) in self.strings.iter().enumerate().skip(1) {
            self.indices.entry(s.clone()).or_insert(i as u32);
        }
        self.indexed = true;
    }

    /// Looks up the string stored at `index`.
    ///
    /// Index `0` resolves to the sentinel entry, which callers must not treat
    /// as a real value.
    pub fn resolve(&self, index: usize) -> Result<&str> {
        let bytes = self
            .strings
            .get(index)
            .ok_or(Error::StringIndexOutOfRange(index))?;
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Like [`StringTable::resolve`], but rejects the sentinel.
    #[inline]
    pub(crate) fn resolve_value(&self, index: usize) -> Result<&str> {
        if index == 0 {
            return Err(Error::MalformedBlock("string index 0 used as a value"));
        }
        self.resolve(index)
    }

    /// Number of real strings, not counting the sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the encoded lengths of all strings in the table.
    #[inline]
    pub fn estimated_byte_size(&self) -> usize {
        self.byte_size
    }

    pub(crate) fn into_pbf(self) -> PbfStringTable {
        PbfStringTable { s: self.strings }
    }
}

/// Converts a string index into the signed representation used by dense
/// tags and relation roles.
#[inline]
pub(crate) fn signed_index(index: u32) -> Result<i32> {
    i32::try_from(index).map_err(|_| Error::StringIndexOutOfRange(index as usize))
}

/// Converts a signed string index read from a block into a table position.
#[inline]
pub(crate) fn table_index(index: i32) -> Result<usize> {
    usize::try_from(index).map_err(|_| Error::MalformedBlock("negative string index"))
}
