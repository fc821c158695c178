//! Learn queue: parameters waiting for their next physical control

use std::collections::VecDeque;
use tracing::warn;

use crate::params::ParamHandle;

/// FIFO of pending link requests; only the front entry can be bound
#[derive(Debug, Clone, Default)]
pub struct LearnQueue {
    pending: VecDeque<ParamHandle>,
}

impl LearnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: ParamHandle) {
        self.pending.push_back(handle);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn front(&self) -> Option<&ParamHandle> {
        self.pending.front()
    }

    /// Pop the front entry, discarding entries whose parameter is gone
    pub fn pop_live(&mut self) -> Option<ParamHandle> {
        while let Some(handle) = self.pending.pop_front() {
            if handle.is_stale() {
                warn!(
                    "Dropping learn request for '{}': parameter no longer exists",
                    handle.path()
                );
                continue;
            }
            return Some(handle);
        }
        None
    }

    /// Paths of pending requests, front first
    pub fn pending_names(&self) -> Vec<String> {
        self.pending.iter().map(|h| h.path().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterGroup;

    #[test]
    fn test_fifo_order() {
        let mut root = ParameterGroup::root();
        let a = root.float("a", 0.0, 1.0, 0.0);
        let b = root.float("b", 0.0, 1.0, 0.0);

        let mut queue = LearnQueue::new();
        queue.push(a.handle());
        queue.push(b.handle());

        assert_eq!(queue.pending_names(), vec!["a", "b"]);
        assert_eq!(queue.front().unwrap().path(), "a");
        assert_eq!(queue.pop_live().unwrap().path(), "a");
        assert_eq!(queue.pop_live().unwrap().path(), "b");
        assert!(queue.pop_live().is_none());
    }

    #[test]
    fn test_pop_live_skips_stale() {
        let mut root = ParameterGroup::root();
        let a = root.float("a", 0.0, 1.0, 0.0);
        let b = root.float("b", 0.0, 1.0, 0.0);

        let mut queue = LearnQueue::new();
        queue.push(a.handle());
        queue.push(b.handle());
        drop(a);
        root.remove("a");

        assert_eq!(queue.pop_live().unwrap().path(), "b");
        assert!(queue.is_empty());
    }
}
