use std::collections::VecDeque;

use rdt_lab_abstract::Segment;

/// Size-bounded FIFO of transmitted but unacknowledged segments, oldest first.
#[derive(Debug)]
pub struct Window {
    capacity: usize,
    segments: VecDeque<Segment>,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            segments: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.segments.len() >= self.capacity
    }

    /// Append the newest outstanding segment.
    ///
    /// Callers check [`Window::is_full`] first; pushing into a full window is a logic error.
    pub fn push(&mut self, segment: Segment) {
        debug_assert!(
            !self.is_full(),
            "push into a full window ({} / {})",
            self.segments.len(),
            self.capacity
        );
        self.segments.push_back(segment);
    }

    /// Remove the oldest outstanding segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }

    pub fn front(&self) -> Option<&Segment> {
        self.segments.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdt_lab_abstract::Endpoint;

    fn seg(n: u64) -> Segment {
        Segment::data(format!("m{n}").as_bytes(), Endpoint::Receiver).with_number(n)
    }

    #[test]
    fn fifo_order_and_capacity() {
        let mut window = Window::new(2);
        assert!(window.is_empty());

        window.push(seg(1));
        window.push(seg(2));
        assert!(window.is_full());
        assert_eq!(window.front().and_then(|s| s.sequence_number), Some(1));

        let numbers: Vec<_> = window.iter().filter_map(|s| s.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2]);

        assert_eq!(window.pop().and_then(|s| s.sequence_number), Some(1));
        assert!(!window.is_full());
        assert_eq!(window.len(), 1);
        assert_eq!(window.capacity(), 2);
    }
}
