//! Generated-to-original position correlation.
//!
//! The printer reports one `(BytePos, line/col)` pair per emitted token:
//! the original byte position of the token's span and the position it landed
//! at in the generated text. Unmodified nodes keep their parsed spans and
//! synthesized imports inherit the span of the specifier they replaced, so
//! resolving each byte position through the source map yields a correct
//! original line/column for every retained token.
//!
//! Lookup policy: a query returns the mapping at or nearest before the
//! queried generated position. A query landing where a deleted statement
//! used to be therefore resolves to the last retained mapping preceding it;
//! only queries before the first mapping return `None`.

use swc_core::common::{BytePos, SourceMap};

/// A position in the original source. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    gen_line: u32,
    gen_col: u32,
    orig_line: u32,
    orig_col: u32,
}

/// Queryable correlation table for one transform call.
#[derive(Debug, Default)]
pub struct PositionMap {
    /// Sorted by generated position.
    mappings: Vec<Mapping>,
}

impl PositionMap {
    /// Builds the table from the printer's raw capture. `gen_line`/`gen_col`
    /// arrive 0-based; dummy byte positions (synthetic tokens with no
    /// origin) are skipped.
    pub(crate) fn build<I>(raw: I, cm: &SourceMap) -> Self
    where
        I: IntoIterator<Item = (BytePos, u32, u32)>,
    {
        let mut mappings: Vec<Mapping> = raw
            .into_iter()
            .filter(|(pos, _, _)| *pos != BytePos(0))
            .map(|(pos, gen_line, gen_col)| {
                let loc = cm.lookup_char_pos(pos);
                Mapping {
                    gen_line: gen_line + 1,
                    gen_col,
                    orig_line: loc.line as u32,
                    orig_col: loc.col.0 as u32,
                }
            })
            .collect();
        mappings.sort_by_key(|m| (m.gen_line, m.gen_col));
        mappings.dedup_by_key(|m| (m.gen_line, m.gen_col));
        Self { mappings }
    }

    /// Original position for a generated (1-based) line and (0-based)
    /// column, per the nearest-preceding policy above.
    pub fn lookup(&self, gen_line: u32, gen_col: u32) -> Option<OriginalPosition> {
        let idx = self
            .mappings
            .partition_point(|m| (m.gen_line, m.gen_col) <= (gen_line, gen_col));
        if idx == 0 {
            return None;
        }
        let m = self.mappings[idx - 1];
        Some(OriginalPosition {
            line: m.orig_line,
            column: m.orig_col,
        })
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(u32, u32, u32, u32)]) -> PositionMap {
        PositionMap {
            mappings: entries
                .iter()
                .map(|&(gen_line, gen_col, orig_line, orig_col)| Mapping {
                    gen_line,
                    gen_col,
                    orig_line,
                    orig_col,
                })
                .collect(),
        }
    }

    #[test]
    fn exact_hit_returns_its_mapping() {
        let m = map(&[(1, 0, 2, 0), (1, 7, 2, 7), (2, 0, 5, 0)]);
        assert_eq!(m.lookup(1, 7), Some(OriginalPosition { line: 2, column: 7 }));
        assert_eq!(m.lookup(2, 0), Some(OriginalPosition { line: 5, column: 0 }));
    }

    #[test]
    fn query_between_mappings_snaps_backwards() {
        let m = map(&[(1, 0, 2, 0), (1, 7, 2, 7), (2, 0, 5, 0)]);
        assert_eq!(m.lookup(1, 3), Some(OriginalPosition { line: 2, column: 0 }));
        // A line with no mappings of its own (deleted region) resolves to
        // the last retained mapping before it.
        assert_eq!(m.lookup(3, 9), Some(OriginalPosition { line: 5, column: 0 }));
    }

    #[test]
    fn query_before_first_mapping_is_none() {
        let m = map(&[(2, 4, 1, 0)]);
        assert_eq!(m.lookup(1, 0), None);
        assert_eq!(m.lookup(2, 3), None);
    }

    #[test]
    fn empty_map_answers_nothing() {
        let m = PositionMap::default();
        assert!(m.is_empty());
        assert_eq!(m.lookup(1, 0), None);
    }
}
