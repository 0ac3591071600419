//! Background prerendering of neighbouring spreads.

use std::collections::VecDeque;

use crate::spread::Spread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreloadDirection {
    Forward,
    Backward,
}

/// A spread waiting to be rendered off screen.
#[derive(Clone, Debug, PartialEq)]
pub struct PreloadTask {
    pub target_index: usize,
    pub direction: PreloadDirection,
    pub spread: Spread,
    /// Spread table generation the task was planned against.
    pub generation: u64,
}

/// Spread indices to prefetch around `current`, nearest first.
///
/// With a budget of `n`, looks `max(1, n - 1)` spreads ahead and whatever
/// budget remains behind. A zero budget prefetches nothing.
pub fn preload_window(current: usize, len: usize, budget: usize) -> Vec<(usize, PreloadDirection)> {
    if budget == 0 {
        return Vec::new();
    }
    let forward = budget.saturating_sub(1).max(1);
    let backward = budget.saturating_sub(forward);

    let ahead = (1..=forward)
        .filter_map(|distance| current.checked_add(distance))
        .filter(|index| *index < len)
        .map(|index| (index, PreloadDirection::Forward));
    let behind = (1..=backward)
        .filter_map(|distance| current.checked_sub(distance))
        .filter(|index| *index < len)
        .map(|index| (index, PreloadDirection::Backward));
    ahead.chain(behind).collect()
}

/// FIFO of preload tasks with a ceiling on how many run at once.
#[derive(Debug)]
pub struct PreloadQueue {
    tasks: VecDeque<PreloadTask>,
    active: usize,
    max_concurrent: usize,
}

impl PreloadQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            tasks: VecDeque::new(),
            active: 0,
            max_concurrent,
        }
    }

    pub fn push(&mut self, task: PreloadTask) {
        self.tasks.push_back(task);
    }

    /// Take the next task if there is room for it, counting it as active.
    pub fn start_next(&mut self) -> Option<PreloadTask> {
        if self.active >= self.max_concurrent {
            return None;
        }
        let task = self.tasks.pop_front()?;
        self.active += 1;
        Some(task)
    }

    /// Mark one active task as done.
    pub fn finish(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_queued(&self, target_index: usize) -> bool {
        self.tasks.iter().any(|task| task.target_index == target_index)
    }

    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.tasks.is_empty()
    }

    /// Drop tasks that have not started. Running tasks still call `finish`.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
