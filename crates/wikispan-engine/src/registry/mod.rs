//! Span registry: the authoritative `[start, end)` of every discovered node.
//!
//! Records live in a generational arena. A [`SpanId`] names a slot and the
//! generation it was issued for, so a handle to a record that died can never
//! read a later record that reuses the slot.

mod kind;

use std::collections::HashMap;
use std::ops::Range;

pub use kind::NodeKind;

use crate::buffer::Span;

/// Stable identifier of a span record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId {
    index: u32,
    generation: u32,
    kind: NodeKind,
}

impl SpanId {
    /// Kind of the construct, known even after the record died.
    pub fn kind(self) -> NodeKind {
        self.kind
    }
}

/// Kind-specific facts fixed at recognition time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Detail {
    #[default]
    None,
    /// Marker widths of a bold or italic run; zero when implicit.
    Quote { open: u8, close: u8 },
    /// `inline` cells start with `||` or `!!`.
    Cell { header: bool, inline: bool },
    /// The list pattern the list was found with.
    List { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    pub kind: NodeKind,
    pub span: Span,
    pub detail: Detail,
}

#[derive(Debug, Clone)]
enum Slot {
    Live { generation: u32, record: SpanRecord },
    Vacant { generation: u32 },
}

type Key = (NodeKind, Span, String);

fn key_of(record: &SpanRecord) -> Key {
    let pattern = match &record.detail {
        Detail::List { pattern } => pattern.clone(),
        _ => String::new(),
    };
    (record.kind, record.span, pattern)
}

/// True when `outer` encloses `inner`: it contains it and is either larger
/// or an outer kind over the same bytes.
pub fn encloses(outer: &SpanRecord, inner: &SpanRecord) -> bool {
    outer.span.contains(inner.span)
        && (outer.span.len() > inner.span.len() || outer.kind.rank() < inner.kind.rank())
}

#[derive(Debug, Clone, Default)]
pub struct SpanRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<Key, u32>,
}

impl SpanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the root record.
    pub fn with_root(kind: NodeKind, span: Span) -> (Self, SpanId) {
        let record = SpanRecord {
            kind,
            span,
            detail: Detail::None,
        };
        let mut registry = Self::default();
        registry.index.insert(key_of(&record), 0);
        registry.slots.push(Slot::Live {
            generation: 0,
            record,
        });
        let root = SpanId {
            index: 0,
            generation: 0,
            kind,
        };
        (registry, root)
    }

    fn slot_index(&self, id: SpanId) -> Option<usize> {
        match self.slots.get(id.index as usize)? {
            Slot::Live { generation, .. } if *generation == id.generation => {
                Some(id.index as usize)
            }
            _ => None,
        }
    }

    pub fn get(&self, id: SpanId) -> Option<&SpanRecord> {
        let i = self.slot_index(id)?;
        match &self.slots[i] {
            Slot::Live { record, .. } => Some(record),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn is_alive(&self, id: SpanId) -> bool {
        self.slot_index(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every live record, in slot order.
    pub fn live(&self) -> impl Iterator<Item = (SpanId, &SpanRecord)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Live { generation, record } => Some((
                SpanId {
                    index: i as u32,
                    generation: *generation,
                    kind: record.kind,
                },
                record,
            )),
            Slot::Vacant { .. } => None,
        })
    }

    fn id_at(&self, index: u32) -> Option<SpanId> {
        match self.slots.get(index as usize)? {
            Slot::Live { generation, record } => Some(SpanId {
                index,
                generation: *generation,
                kind: record.kind,
            }),
            Slot::Vacant { .. } => None,
        }
    }

    /// Registers a construct, or returns the live record with the same
    /// kind, span and list pattern.
    ///
    /// Returns `None` when the span would partially overlap a live span.
    pub fn register(&mut self, kind: NodeKind, span: Span, detail: Detail) -> Option<SpanId> {
        let record = SpanRecord { kind, span, detail };
        let key = key_of(&record);
        if let Some(&index) = self.index.get(&key) {
            if let Some(Slot::Live { record: existing, .. }) = self.slots.get_mut(index as usize) {
                existing.detail = record.detail;
            }
            return self.id_at(index);
        }

        if let Some((other, _)) = self.live().find(|(_, r)| r.span.straddles(span)) {
            log::debug!(
                "not registering {kind:?} at {}..{}: it crosses {:?}",
                span.start,
                span.end,
                other.kind()
            );
            return None;
        }

        let reusable = self.free.pop().and_then(|index| match self.slots[index as usize] {
            Slot::Vacant { generation } => Some((index, generation)),
            Slot::Live { .. } => None,
        });
        let (index, generation) = reusable.unwrap_or_else(|| {
            self.slots.push(Slot::Vacant { generation: 0 });
            ((self.slots.len() - 1) as u32, 0)
        });
        log::trace!("registered {kind:?} at {}..{} in slot {index}", span.start, span.end);
        self.slots[index as usize] = Slot::Live { generation, record };
        self.index.insert(key, index);
        Some(SpanId {
            index,
            generation,
            kind,
        })
    }

    /// Replaces the detail of a live record.
    pub fn set_detail(&mut self, id: SpanId, detail: Detail) {
        let Some(i) = self.slot_index(id) else {
            return;
        };
        if let Slot::Live { record, .. } = &mut self.slots[i] {
            self.index.remove(&key_of(record));
            record.detail = detail;
            self.index.insert(key_of(record), i as u32);
        }
    }

    /// Marks a record dead. Its slot is reused under a new generation.
    pub fn kill(&mut self, id: SpanId) {
        let Some(i) = self.slot_index(id) else {
            return;
        };
        let Slot::Live { generation, record } = &self.slots[i] else {
            return;
        };
        let generation = generation.wrapping_add(1);
        self.index.remove(&key_of(record));
        self.slots[i] = Slot::Vacant { generation };
        self.free.push(i as u32);
    }

    /// Updates every live span for the replacement of `edit` (absolute) by
    /// `new_len` bytes, made through `origin`.
    ///
    /// Spans enclosing the origin, and spans containing the edited range
    /// without being equal to it, grow or shrink at their end. Spans after
    /// it shift. Everything else that overlaps the edit dies.
    pub fn relocate(&mut self, origin: SpanId, edit: Range<usize>, new_len: usize) {
        let Some(origin_record) = self.get(origin).cloned() else {
            return;
        };
        let delta = new_len as isize - edit.len() as isize;
        let moved = |x: usize| (x as isize + delta).max(0) as usize;
        let edited = Span::from(edit.clone());
        let mut dead = 0usize;

        for i in 0..self.slots.len() {
            let Slot::Live { generation, record } = &mut self.slots[i] else {
                continue;
            };
            let generation = *generation;
            let is_origin = i as u32 == origin.index && generation == origin.generation;
            let s = record.span;
            let survives = if is_origin || encloses(record, &origin_record) {
                record.span.end = moved(s.end);
                true
            } else if s.end <= edit.start {
                true
            } else if s.start >= edit.end {
                record.span = Span::new(moved(s.start), moved(s.end));
                true
            } else if s.contains(edited) && s != edited {
                record.span.end = moved(s.end);
                true
            } else {
                false
            };
            if !survives {
                log::debug!(
                    "{:?} at {}..{} died: {}..{} was replaced",
                    record.kind,
                    s.start,
                    s.end,
                    edit.start,
                    edit.end
                );
                self.slots[i] = Slot::Vacant {
                    generation: generation.wrapping_add(1),
                };
                self.free.push(i as u32);
                dead += 1;
            }
        }

        self.index = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Live { record, .. } => Some((key_of(record), i as u32)),
                Slot::Vacant { .. } => None,
            })
            .collect();
        log::debug!(
            "edit {}..{} -> {new_len} bytes via {:?}: {dead} spans died",
            edit.start,
            edit.end,
            origin.kind()
        );
    }

    /// Live records enclosing `id`, narrowest first.
    pub fn enclosing(&self, id: SpanId) -> Vec<SpanId> {
        let Some(target) = self.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<(SpanId, &SpanRecord)> = self
            .live()
            .filter(|(other, record)| *other != id && encloses(record, target))
            .collect();
        found.sort_by(|(_, a), (_, b)| {
            a.span
                .len()
                .cmp(&b.span.len())
                .then(b.kind.rank().cmp(&a.kind.rank()))
        });
        found.into_iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span_of(reg: &SpanRegistry, id: SpanId) -> Option<(usize, usize)> {
        reg.get(id).map(|r| (r.span.start, r.span.end))
    }

    fn reg(kind: NodeKind, reg: &mut SpanRegistry, start: usize, end: usize) -> SpanId {
        reg.register(kind, Span::new(start, end), Detail::None)
            .expect("registers")
    }

    #[test]
    fn registration_is_deduplicated() {
        let mut r = SpanRegistry::new();
        let a = reg(NodeKind::Template, &mut r, 0, 5);
        let b = reg(NodeKind::Template, &mut r, 0, 5);
        let c = reg(NodeKind::WikiLink, &mut r, 6, 9);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn crossing_spans_are_refused() {
        let mut r = SpanRegistry::new();
        reg(NodeKind::Tag, &mut r, 0, 10);
        assert_eq!(r.register(NodeKind::Bold, Span::new(5, 15), Detail::None), None);
        assert!(r.register(NodeKind::Bold, Span::new(2, 8), Detail::None).is_some());
    }

    #[test]
    fn lists_with_different_patterns_are_distinct() {
        let mut r = SpanRegistry::new();
        let a = r.register(
            NodeKind::WikiList,
            Span::new(0, 4),
            Detail::List { pattern: r"\*".into() },
        );
        let b = r.register(
            NodeKind::WikiList,
            Span::new(0, 4),
            Detail::List { pattern: r"\*\#".into() },
        );
        assert_ne!(a, b);
    }

    #[test]
    fn edit_shifts_grows_and_kills() {
        // {{a|b}} {{c|{{d}}}}
        let mut r = SpanRegistry::new();
        let doc = reg(NodeKind::Document, &mut r, 0, 19);
        let first = reg(NodeKind::Template, &mut r, 0, 7);
        let arg = reg(NodeKind::Argument, &mut r, 3, 5);
        let outer = reg(NodeKind::Template, &mut r, 8, 19);
        let inner = reg(NodeKind::Template, &mut r, 12, 17);

        // Replace `b` (4..5) with `xyz` through the argument.
        r.relocate(arg, 4..5, 3);
        assert_eq!(span_of(&r, doc), Some((0, 21)));
        assert_eq!(span_of(&r, first), Some((0, 9)));
        assert_eq!(span_of(&r, arg), Some((3, 7)));
        assert_eq!(span_of(&r, outer), Some((10, 21)));
        assert_eq!(span_of(&r, inner), Some((14, 19)));

        // Replace the whole outer template's text.
        r.relocate(outer, 10..21, 5);
        assert_eq!(span_of(&r, outer), Some((10, 15)));
        assert!(!r.is_alive(inner));
        assert_eq!(span_of(&r, doc), Some((0, 15)));
    }

    #[test]
    fn equal_span_inner_kind_dies_with_outer_edit() {
        let mut r = SpanRegistry::new();
        let italic = reg(NodeKind::Italic, &mut r, 0, 11);
        let bold = reg(NodeKind::Bold, &mut r, 0, 11);
        r.relocate(italic, 0..11, 4);
        assert!(!r.is_alive(bold));
        assert_eq!(span_of(&r, italic), Some((0, 4)));
    }

    #[test]
    fn dead_ids_stay_dead_after_slot_reuse() {
        let mut r = SpanRegistry::new();
        let a = reg(NodeKind::Comment, &mut r, 0, 4);
        r.kill(a);
        let b = reg(NodeKind::Comment, &mut r, 0, 4);
        assert!(!r.is_alive(a));
        assert!(r.is_alive(b));
        assert_eq!(r.get(a), None);
    }

    #[test]
    fn enclosing_is_narrowest_first() {
        let mut r = SpanRegistry::new();
        let doc = reg(NodeKind::Document, &mut r, 0, 20);
        let outer = reg(NodeKind::Template, &mut r, 0, 20);
        let mid = reg(NodeKind::ParserFunction, &mut r, 2, 18);
        let leaf = reg(NodeKind::Comment, &mut r, 5, 9);
        assert_eq!(r.enclosing(leaf), vec![mid, outer, doc]);
    }
}
