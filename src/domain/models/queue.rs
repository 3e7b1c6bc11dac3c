use std::cmp::Ordering;
use std::collections::VecDeque;

/// Priority queue entry wrapper.
///
/// Lower priority values dequeue first (simple tier = 1 drains ahead of
/// complex = 3). Entries with equal priority keep FIFO order.
#[derive(Debug, Clone)]
struct QueueEntry<T> {
    priority: u8,
    item: T,
}

impl<T> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<T> Eq for QueueEntry<T> {}

impl<T> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Generic priority queue with FIFO ordering inside a priority level.
///
/// # Examples
///
/// ```
/// use crucible::domain::models::PriorityQueue;
///
/// let mut queue = PriorityQueue::new();
/// queue.enqueue("complex", 3);
/// queue.enqueue("simple", 1);
/// queue.enqueue("moderate", 2);
///
/// assert_eq!(queue.dequeue(), Some("simple"));
/// assert_eq!(queue.dequeue(), Some("moderate"));
/// assert_eq!(queue.dequeue(), Some("complex"));
/// ```
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    entries: VecDeque<QueueEntry<T>>,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Insert an item at the position its priority dictates. Equal
    /// priorities keep arrival order.
    pub fn enqueue(&mut self, item: T, priority: u8) {
        let entry = QueueEntry { priority, item };
        let position = self
            .entries
            .iter()
            .position(|existing| entry < *existing)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    /// Remove and return the front (lowest priority value) item.
    pub fn dequeue(&mut self) -> Option<T> {
        self.entries.pop_front().map(|entry| entry.item)
    }

    /// Front item without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.entries.front().map(|entry| &entry.item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate items in dequeue order without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.item)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
