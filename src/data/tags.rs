use std::collections::BTreeMap;

use super::strings::{signed_index, table_index, StringTable};
use crate::error::{Error, Result};

/// Tags of a primitive. Keys are unique.
pub type Tags = BTreeMap<String, String>;

/// Resolves the parallel `keys`/`vals` index arrays of a plain node, way or
/// relation.
pub(crate) fn decode_tags(strings: &StringTable, keys: &[u32], vals: &[u32]) -> Result<Tags> {
    if keys.len() != vals.len() {
        return Err(Error::MalformedBlock("tag keys and values differ in length"));
    }
    keys.iter()
        .zip(vals)
        .map(|(&k, &v)| {
            let key = strings.resolve_value(k as usize)?;
            let value = strings.resolve_value(v as usize)?;
            Ok::<_, Error>((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Interns `tags` and returns the `keys`/`vals` index arrays.
pub(crate) fn encode_tags(strings: &mut StringTable, tags: &Tags) -> (Vec<u32>, Vec<u32>) {
    tags.iter()
        .map(|(k, v)| (strings.intern(k), strings.intern(v)))
        .unzip()
}

/// Walks the flattened `keys_vals` column of a dense node group.
///
/// Each node's tags are a run of `(key, value)` index pairs closed by a
/// single `0`. An empty column means no node of the group has tags.
pub(crate) struct DenseTags<'l> {
    strings: &'l StringTable,
    key_values: &'l [i32],
    pos: usize,
}

impl<'l> DenseTags<'l> {
    #[inline]
    pub(crate) fn new(strings: &'l StringTable, key_values: &'l [i32]) -> Self {
        Self {
            strings,
            key_values,
            pos: 0,
        }
    }

    /// Tags of the next node.
    pub(crate) fn next_node(&mut self) -> Result<Tags> {
        let mut tags = Tags::new();
        if self.key_values.is_empty() {
            return Ok(tags);
        }
        loop {
            let key = match self.key_values.get(self.pos).copied() {
                Some(0) => {
                    self.pos += 1;
                    return Ok(tags);
                }
                Some(key) => key,
                None => return Err(Error::MalformedBlock("dense tags are not terminated")),
            };
            let value = self
                .key_values
                .get(self.pos + 1)
                .copied()
                .ok_or(Error::MalformedBlock("dense tag key without value"))?;
            self.pos += 2;
            let key = self.strings.resolve(table_index(key)?)?;
            let value = self.strings.resolve_value(table_index(value)?)?;
            tags.insert(key.to_owned(), value.to_owned());
        }
    }
}

/// Appends `tags` and the closing `0` to a dense `keys_vals` column.
pub(crate) fn encode_dense_tags(
    strings: &mut StringTable,
    tags: &Tags,
    key_values: &mut Vec<i32>,
) -> Result<()> {
    let mut run = Vec::with_capacity(tags.len() * 2 + 1);
    for (k, v) in tags {
        run.push(signed_index(strings.intern(k))?);
        run.push(signed_index(strings.intern(v))?);
    }
    run.push(0);
    key_values.extend(run);
    Ok(())
}
