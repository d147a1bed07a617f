//! Traversal Worklist
//!
//! Both lifetime passes replace recursion with an explicit stack, so
//! traversal depth is bounded by heap size rather than thread stack size.

/// A LIFO stack of pending traversal work.
///
/// # Example
///
/// ```
/// use tgc::worklist::WorkStack;
///
/// let mut stack: WorkStack<usize> = WorkStack::with_capacity(8);
/// stack.push(0x1000);
/// stack.push(0x2000);
/// assert_eq!(stack.pop(), Some(0x2000));
/// assert_eq!(stack.pop(), Some(0x1000));
/// assert_eq!(stack.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct WorkStack<T> {
    items: Vec<T>,
}

impl<T> WorkStack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Stack with room for `capacity` entries before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Most recently pushed entry, or `None` when drained.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

impl<T> Default for WorkStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
