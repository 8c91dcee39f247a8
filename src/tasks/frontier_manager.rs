use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet, VecDeque},
};

use crate::types::{
    configs::frontier_config::FrontierPolicy,
    structs::{candidate::Candidate, link::Link},
};

/// Result of charging downloaded bytes against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub remaining: u64,
    pub exhausted: bool,
}

// Heap entry, highest priority first and earliest offer among equals.
#[derive(Debug)]
struct Ranked {
    priority: f64,
    seq: u64,
    candidate: Candidate,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum Queue {
    Fifo(VecDeque<Candidate>),
    Priority(BinaryHeap<Ranked>),
}

/// Owns the candidates still to be decided and the byte ledger of the run.
pub struct FrontierManager {
    queue: Queue,
    queued: HashSet<Link>,
    in_flight: HashSet<Link>,
    visited: HashSet<Link>,
    seq: u64,
    ceiling: u64,
    charged: u64,
    exhausted: bool,
}

impl FrontierManager {
    pub fn new(policy: FrontierPolicy, ceiling: u64) -> Self {
        let queue = match policy {
            FrontierPolicy::Fifo => Queue::Fifo(VecDeque::new()),
            FrontierPolicy::Priority => Queue::Priority(BinaryHeap::new()),
        };

        Self {
            queue,
            queued: HashSet::new(),
            in_flight: HashSet::new(),
            visited: HashSet::new(),
            seq: 0,
            ceiling,
            charged: 0,
            exhausted: ceiling == 0,
        }
    }

    /// Queues the candidates whose links were never seen before and returns
    /// how many were accepted.
    pub fn offer(&mut self, candidates: Vec<Candidate>) -> usize {
        let mut accepted = 0;

        for candidate in candidates {
            if self.is_known(&candidate.link) {
                continue;
            }

            self.queued.insert(candidate.link.clone());
            self.seq += 1;
            accepted += 1;

            match &mut self.queue {
                Queue::Fifo(queue) => queue.push_back(candidate),
                Queue::Priority(heap) => heap.push(Ranked {
                    priority: if candidate.priority.is_finite() {
                        candidate.priority
                    } else {
                        0.0
                    },
                    seq: self.seq,
                    candidate,
                }),
            }
        }

        accepted
    }

    /// Hands out the next candidate and marks it in flight.
    pub fn next(&mut self) -> Option<Candidate> {
        loop {
            let candidate = match &mut self.queue {
                Queue::Fifo(queue) => queue.pop_front(),
                Queue::Priority(heap) => heap.pop().map(|ranked| ranked.candidate),
            }?;

            // Links visited while still queued are stale
            if !self.queued.remove(&candidate.link) {
                continue;
            }

            self.in_flight.insert(candidate.link.clone());
            return Some(candidate);
        }
    }

    pub fn record_visited(&mut self, link: &Link) {
        self.in_flight.remove(link);
        self.queued.remove(link);
        self.visited.insert(link.clone());
    }

    pub fn is_known(&self, link: &Link) -> bool {
        self.queued.contains(link) || self.in_flight.contains(link) || self.visited.contains(link)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    pub fn charge(&mut self, bytes: u64) -> Charge {
        self.charged = self.charged.saturating_add(bytes);

        if self.charged >= self.ceiling {
            self.exhausted = true;
        }

        Charge {
            remaining: self.remaining(),
            exhausted: self.exhausted,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn charged(&self) -> u64 {
        self.charged
    }

    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.charged)
    }
}
