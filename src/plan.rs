//! A priority queue that stores arbitrary data sorted by time
//!
//! Defines a `Queue<T>` that stores items of type `T` sorted by `f64` time and
//! an `ExecutionPhase`, called 'plans'. Adding and retrieving a plan are
//! *O*(log(*n*)).
//!
//! `Context` uses this queue to hold the callbacks that drive the weekly
//! cycle of the simulation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::hashing::{HashMap, HashMapExt};

/// The phase of a time step in which a plan runs. Plans scheduled for the
/// same time run in phase order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ExecutionPhase {
    First,
    #[default]
    Normal,
    Last,
}

/// A priority queue that stores arbitrary data sorted by time
///
/// When plans are created they are sequentially assigned a `PlanId`. Plans
/// at the same time are ordered by phase, and then by the order in which
/// they were added.
///
/// The time, plan id and phase are stored in a binary heap of `Entry`
/// objects and the payload in a hash map by plan id.
pub struct Queue<T> {
    queue: BinaryHeap<Entry>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T> Queue<T> {
    #[must_use]
    pub fn new() -> Queue<T> {
        Queue {
            queue: BinaryHeap::new(),
            data_map: HashMap::new(),
            plan_counter: 0,
        }
    }

    /// Add a plan to the queue at the specified time and phase
    pub fn add_plan(&mut self, time: f64, data: T, phase: ExecutionPhase) -> PlanId {
        let id = self.plan_counter;
        self.queue.push(Entry { time, id, phase });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
        PlanId(id)
    }

    /// Retrieve the earliest plan in the queue
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        let entry = self.queue.pop()?;
        let data = self.data_map.remove(&entry.id)?;
        Some(Plan {
            time: entry.time,
            data,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.data_map.clear();
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq, Debug)]
struct Entry {
    time: f64,
    id: u64,
    phase: ExecutionPhase,
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `BinaryHeap` is a max-heap, so every comparison is reversed.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.phase.cmp(&other.phase))
            .then_with(|| self.id.cmp(&other.id))
            .reverse()
    }
}

/// A unique identifier for a plan added to a `Queue<T>`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlanId(u64);

/// A plan that holds data of type `T` intended to be used at the specified time
pub struct Plan<T> {
    pub time: f64,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue() {
        let mut plan_queue = Queue::<()>::new();
        assert!(plan_queue.get_next_plan().is_none());
        assert!(plan_queue.is_empty());
    }

    #[test]
    fn add_plans() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(3.0, 3, ExecutionPhase::Normal);
        plan_queue.add_plan(1.0, 1, ExecutionPhase::Normal);
        plan_queue.add_plan(2.0, 2, ExecutionPhase::Normal);

        let order: Vec<i32> = std::iter::from_fn(|| plan_queue.get_next_plan())
            .map(|plan| plan.data)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn same_time_orders_by_phase_then_id() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1.0, "normal-a", ExecutionPhase::Normal);
        plan_queue.add_plan(1.0, "last", ExecutionPhase::Last);
        plan_queue.add_plan(1.0, "normal-b", ExecutionPhase::Normal);
        plan_queue.add_plan(1.0, "first", ExecutionPhase::First);

        let order: Vec<&str> = std::iter::from_fn(|| plan_queue.get_next_plan())
            .map(|plan| plan.data)
            .collect();
        assert_eq!(order, vec!["first", "normal-a", "normal-b", "last"]);
    }
}
