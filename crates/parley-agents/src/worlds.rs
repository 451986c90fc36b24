//! Possible worlds: the bijections a logical agent still considers.
//!
//! A world is a permutation of native-vocabulary indices. Slot `i` holds the
//! native reading of the `i`-th foreign symbol the agent has heard, in
//! first-heard order. Worlds are stored flat, `n` bytes each.

use crate::alignment::Alignment;
use parley_core::types::{Symbol, SymbolMap};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::warn;

/// Largest vocabulary whose permutations are enumerated eagerly.
pub const MAX_WORLD_VOCABULARY: usize = 10;

/// A falsified reading: every world matching it is removed.
///
/// A world matches when it maps `foreign` to `native`, maps each `pinned`
/// foreign slot to its native index, and maps none of the `avoid` slots into
/// `reserved`.
#[derive(Debug, Clone, Default)]
pub struct Refutation {
    pub foreign: usize,
    pub native: usize,
    pub pinned: Vec<(usize, usize)>,
    pub avoid: Vec<usize>,
    pub reserved: Vec<usize>,
}

impl Refutation {
    fn matches(&self, world: &[u8]) -> bool {
        world[self.foreign] as usize == self.native
            && self.pinned.iter().all(|&(f, n)| world[f] as usize == n)
            && self
                .avoid
                .iter()
                .all(|&f| !self.reserved.contains(&(world[f] as usize)))
    }
}

#[derive(Debug, Clone)]
pub struct PossibleWorlds {
    vocabulary: Vec<Symbol>,
    known: Vec<Symbol>,
    cells: Vec<u8>,
}

impl PossibleWorlds {
    /// All `n!` bijections over `vocabulary`. Callers keep `n` at or below
    /// [`MAX_WORLD_VOCABULARY`].
    pub fn new(vocabulary: Vec<Symbol>) -> Self {
        let cells = all_permutations(vocabulary.len());
        Self {
            vocabulary,
            known: Vec::new(),
            cells,
        }
    }

    fn width(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn len(&self) -> usize {
        match self.width() {
            0 => 0,
            n => self.cells.len() / n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.width().max(1))
    }

    pub fn vocabulary(&self) -> &[Symbol] {
        &self.vocabulary
    }

    /// Foreign symbols in first-heard order.
    pub fn known(&self) -> &[Symbol] {
        &self.known
    }

    pub fn slot(&self, foreign: &Symbol) -> Option<usize> {
        self.known.iter().position(|k| k == foreign)
    }

    pub fn native_index(&self, native: &Symbol) -> Option<usize> {
        self.vocabulary.iter().position(|v| v == native)
    }

    /// Slot of `foreign`, assigning the next free one on first hearing.
    /// `None` once more distinct symbols were heard than there are natives.
    pub fn learn(&mut self, foreign: &Symbol) -> Option<usize> {
        if let Some(slot) = self.slot(foreign) {
            return Some(slot);
        }
        if self.known.len() >= self.width() {
            return None;
        }
        self.known.push(foreign.clone());
        Some(self.known.len() - 1)
    }

    /// Whether some surviving world reads slot `foreign` as `native`.
    pub fn supports(&self, foreign: usize, native: usize) -> bool {
        self.iter().any(|w| w[foreign] as usize == native)
    }

    /// Drop every world matching `refutation`; returns how many went.
    ///
    /// The set never grows. A refutation that would remove every surviving
    /// world contradicts earlier observations and is ignored.
    pub fn eliminate(&mut self, refutation: &Refutation) -> usize {
        let before = self.len();
        let width = self.width();
        let mut kept = Vec::with_capacity(self.cells.len());
        for world in self.cells.chunks(width.max(1)) {
            if !refutation.matches(world) {
                kept.extend_from_slice(world);
            }
        }
        if kept.is_empty() && before > 0 {
            warn!(
                worlds = before,
                foreign = refutation.foreign,
                native = refutation.native,
                "Refutation contradicts every surviving world, ignoring it"
            );
            return 0;
        }
        self.cells = kept;
        before - self.len()
    }

    /// The mapping a world assigns to every known foreign symbol.
    pub fn mapping(&self, world: &[u8]) -> SymbolMap {
        self.known
            .iter()
            .zip(world.iter())
            .map(|(f, &n)| (f.clone(), self.vocabulary[n as usize].clone()))
            .collect()
    }

    /// The sole survivor, or a random one when several remain.
    pub fn representative(&self, rng: &mut StdRng) -> Option<Vec<u8>> {
        match self.len() {
            0 => None,
            1 => self.iter().next().map(|w| w.to_vec()),
            n => self.iter().nth(rng.gen_range(0..n)).map(|w| w.to_vec()),
        }
    }

    /// A certain alignment built from `world`.
    pub fn alignment_of(&self, world: &[u8]) -> Alignment {
        Alignment::from_mapping(self.vocabulary.clone(), &self.mapping(world))
    }
}

fn all_permutations(n: usize) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let mut current: Vec<u8> = (0..n as u8).collect();
    let mut cells = Vec::with_capacity(n * (1..=n).product::<usize>());
    loop {
        cells.extend_from_slice(&current);
        if !next_permutation(&mut current) {
            break;
        }
    }
    cells
}

/// Lexicographic successor in place; `false` after the last permutation.
fn next_permutation(p: &mut [u8]) -> bool {
    let Some(i) = (1..p.len()).rev().find(|&i| p[i - 1] < p[i]) else {
        return false;
    };
    let pivot = i - 1;
    let mut j = p.len() - 1;
    while p[j] <= p[pivot] {
        j -= 1;
    }
    p.swap(pivot, j);
    p[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn worlds(n: usize) -> PossibleWorlds {
        PossibleWorlds::new((0..n).map(|i| Symbol::new(format!("v{}", i))).collect())
    }

    #[test]
    fn enumerates_every_bijection() {
        assert_eq!(worlds(1).len(), 1);
        assert_eq!(worlds(3).len(), 6);
        assert_eq!(worlds(4).len(), 24);
        let w = worlds(3);
        let mut seen: Vec<Vec<u8>> = w.iter().map(|x| x.to_vec()).collect();
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn learn_fills_slots_then_refuses() {
        let mut w = worlds(2);
        assert_eq!(w.learn(&"p".into()), Some(0));
        assert_eq!(w.learn(&"q".into()), Some(1));
        assert_eq!(w.learn(&"p".into()), Some(0));
        assert_eq!(w.learn(&"r".into()), None);
    }

    #[test]
    fn eliminate_removes_matching_worlds() {
        let mut w = worlds(3);
        let removed = w.eliminate(&Refutation {
            foreign: 0,
            native: 1,
            ..Default::default()
        });
        assert_eq!(removed, 2);
        assert_eq!(w.len(), 4);
        assert!(!w.supports(0, 1));
    }

    #[test]
    fn pinned_elimination_is_joint() {
        let mut w = worlds(3);
        w.eliminate(&Refutation {
            foreign: 1,
            native: 2,
            pinned: vec![(0, 0)],
            ..Default::default()
        });
        assert_eq!(w.len(), 5);
        assert!(w.supports(1, 2));
    }

    #[test]
    fn avoid_keeps_worlds_reading_into_reserved() {
        let mut w = worlds(3);
        // slot 1 -> 0 where slot 0 avoids native 2: only [1,0,2] matches
        w.eliminate(&Refutation {
            foreign: 1,
            native: 0,
            avoid: vec![0],
            reserved: vec![2],
            ..Default::default()
        });
        assert_eq!(w.len(), 5);
        assert!(w.iter().any(|x| x == [2, 0, 1]));
    }

    #[test]
    fn contradicting_refutation_keeps_survivors() {
        let mut w = worlds(2);
        assert_eq!(w.eliminate(&Refutation { foreign: 0, native: 0, ..Default::default() }), 1);
        assert_eq!(w.len(), 1);
        assert_eq!(w.eliminate(&Refutation { foreign: 0, native: 1, ..Default::default() }), 0);
        assert_eq!(w.len(), 1);
        assert!(w.supports(0, 1));
    }

    #[test]
    fn repeated_refutations_never_grow_the_set() {
        let mut w = worlds(4);
        let mut last = w.len();
        for foreign in 0..4 {
            for native in 0..4 {
                w.eliminate(&Refutation { foreign, native, ..Default::default() });
                assert!(w.len() <= last);
                assert!(!w.is_empty());
                last = w.len();
            }
        }
        assert_eq!(last, 1);
    }

    #[test]
    fn representative_of_single_world_is_it() {
        let mut w = worlds(2);
        w.learn(&"p".into());
        w.eliminate(&Refutation { foreign: 0, native: 1, ..Default::default() });
        let mut rng = StdRng::seed_from_u64(1);
        let rep = w.representative(&mut rng).unwrap();
        assert_eq!(rep, vec![0, 1]);
        let alg = w.alignment_of(&rep);
        assert_eq!(alg.best(&"p".into()), Some(&Symbol::from("v0")));
    }
}
