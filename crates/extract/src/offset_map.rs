//! Translation between extracted GraphQL offsets and parent-file offsets.

/// One contiguous run of the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Segment {
    /// Start offset in the extracted GraphQL text
    graphql: usize,
    graphql_len: usize,
    /// Start offset in the parent file
    parent: usize,
    parent_len: usize,
    /// Copied byte-for-byte from the parent (as opposed to a stand-in)
    verbatim: bool,
}

/// Maps offsets in an extracted document back to the parent file, and back.
///
/// Verbatim runs map one-to-one. Offsets that fall inside a stand-in (a
/// substituted placeholder or a synthetic fragment name) map to the start of
/// the parent text the stand-in replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OffsetMap {
    segments: Vec<Segment>,
}

impl OffsetMap {
    /// A map for text copied unchanged from `parent_start` onwards.
    #[must_use]
    pub fn identity(parent_start: usize, len: usize) -> Self {
        let mut map = Self::default();
        map.push_verbatim(0, parent_start, len);
        map
    }

    pub(crate) fn push_verbatim(&mut self, graphql: usize, parent: usize, len: usize) {
        if len == 0 {
            return;
        }
        if let Some(last) = self.segments.last_mut() {
            if last.verbatim
                && last.graphql + last.graphql_len == graphql
                && last.parent + last.parent_len == parent
            {
                last.graphql_len += len;
                last.parent_len += len;
                return;
            }
        }
        self.segments.push(Segment {
            graphql,
            graphql_len: len,
            parent,
            parent_len: len,
            verbatim: true,
        });
    }

    pub(crate) fn push_synthetic(
        &mut self,
        graphql: usize,
        graphql_len: usize,
        parent: usize,
        parent_len: usize,
    ) {
        self.segments.push(Segment {
            graphql,
            graphql_len,
            parent,
            parent_len,
            verbatim: false,
        });
    }

    /// Absolute parent-file offset for an offset in the extracted text.
    ///
    /// Offsets past the end clamp to the end of the last segment.
    #[must_use]
    pub fn to_parent(&self, offset: usize) -> usize {
        for segment in &self.segments {
            if offset < segment.graphql + segment.graphql_len {
                if offset < segment.graphql {
                    return segment.parent;
                }
                return if segment.verbatim {
                    segment.parent + (offset - segment.graphql)
                } else {
                    segment.parent
                };
            }
        }
        self.segments
            .last()
            .map_or(offset, |last| last.parent + last.parent_len)
    }

    /// Offset in the extracted text for an absolute parent-file offset, if the
    /// parent offset lies inside this document.
    #[must_use]
    pub fn to_graphql(&self, parent_offset: usize) -> Option<usize> {
        self.segments.iter().find_map(|segment| {
            let end = segment.parent + segment.parent_len;
            if parent_offset < segment.parent || parent_offset > end {
                return None;
            }
            if segment.verbatim {
                Some(segment.graphql + (parent_offset - segment.parent))
            } else {
                Some(segment.graphql)
            }
        })
    }

    /// Whether the whole extracted text was copied unchanged.
    #[must_use]
    pub fn is_verbatim(&self) -> bool {
        self.segments.len() <= 1 && self.segments.iter().all(|s| s.verbatim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_map() {
        let map = OffsetMap::identity(100, 10);
        assert_eq!(map.to_parent(0), 100);
        assert_eq!(map.to_parent(9), 109);
        assert_eq!(map.to_parent(10), 110);
        assert_eq!(map.to_graphql(105), Some(5));
        assert_eq!(map.to_graphql(99), None);
        assert!(map.is_verbatim());
    }

    #[test]
    fn test_adjacent_verbatim_runs_merge() {
        let mut map = OffsetMap::default();
        map.push_verbatim(0, 10, 5);
        map.push_verbatim(5, 15, 5);
        assert!(map.is_verbatim());
    }

    #[test]
    fn test_synthetic_segment_maps_to_placeholder_start() {
        // parent:  "{ a ${X} b }" at offset 50, placeholder "${X}" at 54..58
        // graphql: "{ a ...__Interpolation0 b }"
        let mut map = OffsetMap::default();
        map.push_verbatim(0, 50, 4);
        map.push_synthetic(4, 19, 54, 4);
        map.push_verbatim(23, 58, 4);

        assert_eq!(map.to_parent(2), 52);
        assert_eq!(map.to_parent(10), 54);
        assert_eq!(map.to_parent(24), 59);
        assert_eq!(map.to_graphql(59), Some(24));
        assert_eq!(map.to_graphql(56), Some(4));
        assert!(!map.is_verbatim());
    }
}
