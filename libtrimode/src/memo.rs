//! The packrat cache. Keys are (nonterminal, input offset, kind); values are
//! either a recorded failure or the event diff the nonterminal produced plus
//! the offset it ended at. Entries are write-once.

use crate::event::Event;
use crate::grammar::NonterminalId;
use im::Vector;
use std::collections::HashMap;

/// Seed entries record only the non-left-recursive base of a nonterminal at
/// an offset; Whole entries record the full (possibly grown) result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoKind {
    Seed,
    Whole,
}

#[derive(Debug, Clone)]
pub enum Memo {
    Failed,
    Passed { end: usize, diff: Vector<Event> },
}

/// Cache contract for `Reference` execution in parse mode. Swap in a custom
/// implementation to observe or bound memoization.
pub trait PackratCache {
    fn get(&self, nonterminal: NonterminalId, offset: usize, kind: MemoKind) -> Option<&Memo>;

    fn put(
        &mut self,
        nonterminal: NonterminalId,
        offset: usize,
        kind: MemoKind,
        end: usize,
        diff: Vector<Event>,
    );

    fn put_failure(&mut self, nonterminal: NonterminalId, offset: usize, kind: MemoKind);
}

#[derive(Debug, Default)]
pub struct MemoTable {
    entries: HashMap<(NonterminalId, usize, MemoKind), Memo>,
}

impl MemoTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_once(&mut self, key: (NonterminalId, usize, MemoKind), memo: Memo) {
        use std::collections::hash_map::Entry;
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(memo);
            }
            Entry::Occupied(_) => {
                debug_assert!(false, "packrat entries are write-once");
            }
        }
    }
}

impl PackratCache for MemoTable {
    fn get(&self, nonterminal: NonterminalId, offset: usize, kind: MemoKind) -> Option<&Memo> {
        self.entries.get(&(nonterminal, offset, kind))
    }

    fn put(
        &mut self,
        nonterminal: NonterminalId,
        offset: usize,
        kind: MemoKind,
        end: usize,
        diff: Vector<Event>,
    ) {
        self.insert_once((nonterminal, offset, kind), Memo::Passed { end, diff });
    }

    fn put_failure(&mut self, nonterminal: NonterminalId, offset: usize, kind: MemoKind) {
        self.insert_once((nonterminal, offset, kind), Memo::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use im::Vector;

    #[test]
    fn seed_and_whole_are_independent_keys() {
        let nt = NonterminalId(0);
        let mut table = MemoTable::default();
        table.put_failure(nt, 0, MemoKind::Seed);
        table.put(nt, 0, MemoKind::Whole, 3, Vector::new());

        assert_matches!(table.get(nt, 0, MemoKind::Seed), Some(Memo::Failed));
        assert_matches!(
            table.get(nt, 0, MemoKind::Whole),
            Some(Memo::Passed { end: 3, .. })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn distinct_offsets_do_not_collide() {
        let nt = NonterminalId(1);
        let mut table = MemoTable::default();
        table.put_failure(nt, 0, MemoKind::Whole);
        assert!(table.get(nt, 1, MemoKind::Whole).is_none());
    }
}
