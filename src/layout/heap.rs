use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Binary min-heap keyed by `S`. Items with equal scores pop in insertion
/// order, which keeps searches deterministic.
#[derive(Debug)]
pub(super) struct MinHeap<S: Ord, T> {
    heap: BinaryHeap<HeapEntry<S, T>>,
    next_seq: u64,
}

#[derive(Debug)]
struct HeapEntry<S, T> {
    score: S,
    seq: u64,
    item: T,
}

impl<S: Ord, T> Ord for HeapEntry<S, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` is a max-heap.
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<S: Ord, T> PartialOrd for HeapEntry<S, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Ord, T> PartialEq for HeapEntry<S, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: Ord, T> Eq for HeapEntry<S, T> {}

impl<S: Ord, T> MinHeap<S, T> {
    pub(super) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub(super) fn push(&mut self, score: S, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry { score, seq, item });
    }

    pub(super) fn pop(&mut self) -> Option<(S, T)> {
        self.heap.pop().map(|entry| (entry.score, entry.item))
    }
}
