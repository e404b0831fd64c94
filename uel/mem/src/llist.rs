//! Doubly-linked list whose nodes are served by an [`ObjectPool`].
//!
//! The list only stores its head, tail and length. Nodes live in a pool that
//! may be shared by many lists, so every operation takes the pool explicitly.
//! Passing a pool other than the one the list was built with is a logic error
//! and surfaces as [`UelError::StaleHandle`] or [`UelError::PoolOverflow`].

use core::fmt;

use uel_core::{UelError, UelResult};

use crate::pool::{ObjectPool, PoolHandle};

/// Handle to a node of a [`LinkedList<T>`]
pub type NodeHandle<T> = PoolHandle<ListNode<T>>;

/// A pooled list node
pub struct ListNode<T> {
    value: T,
    prev: Option<NodeHandle<T>>,
    next: Option<NodeHandle<T>>,
}

impl<T> ListNode<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn prev(&self) -> Option<NodeHandle<T>> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeHandle<T>> {
        self.next
    }
}

/// Doubly-linked list of `T`
pub struct LinkedList<T> {
    head: Option<NodeHandle<T>>,
    tail: Option<NodeHandle<T>>,
    count: usize,
}

impl<T> LinkedList<T> {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Handle of the first node
    pub fn head(&self) -> Option<NodeHandle<T>> {
        self.head
    }

    /// Handle of the last node
    pub fn tail(&self) -> Option<NodeHandle<T>> {
        self.tail
    }

    /// Handle of the node following `node`
    pub fn next_of<const N: usize>(
        &self,
        nodes: &ObjectPool<ListNode<T>, N>,
        node: NodeHandle<T>,
    ) -> Option<NodeHandle<T>> {
        nodes.get(node).and_then(ListNode::next)
    }

    /// Value stored at the head
    pub fn peek_head<'p, const N: usize>(&self, nodes: &'p ObjectPool<ListNode<T>, N>) -> Option<&'p T> {
        self.head.and_then(|head| nodes.get(head)).map(ListNode::value)
    }

    /// Value stored at the tail
    pub fn peek_tail<'p, const N: usize>(&self, nodes: &'p ObjectPool<ListNode<T>, N>) -> Option<&'p T> {
        self.tail.and_then(|tail| nodes.get(tail)).map(ListNode::value)
    }

    pub fn push_head<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        value: T,
    ) -> UelResult<NodeHandle<T>> {
        match self.head {
            Some(head) => self.insert_before(nodes, head, value),
            None => self.push_first(nodes, value),
        }
    }

    pub fn push_tail<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        value: T,
    ) -> UelResult<NodeHandle<T>> {
        let Some(tail) = self.tail else {
            return self.push_first(nodes, value);
        };

        let node = nodes.acquire(ListNode {
            value,
            prev: Some(tail),
            next: None,
        })?;
        if let Some(last) = nodes.get_mut(tail) {
            last.next = Some(node);
        }
        self.tail = Some(node);
        self.count += 1;
        Ok(node)
    }

    pub fn pop_head<const N: usize>(&mut self, nodes: &mut ObjectPool<ListNode<T>, N>) -> Option<T> {
        let head = self.head?;
        self.unlink(nodes, head).ok()
    }

    pub fn pop_tail<const N: usize>(&mut self, nodes: &mut ObjectPool<ListNode<T>, N>) -> Option<T> {
        let tail = self.tail?;
        self.unlink(nodes, tail).ok()
    }

    /// Whether `node` belongs to this list
    pub fn contains<const N: usize>(&self, nodes: &ObjectPool<ListNode<T>, N>, node: NodeHandle<T>) -> bool {
        let mut cursor = self.head;
        while let Some(current) = cursor {
            if current == node {
                return true;
            }
            cursor = self.next_of(nodes, current);
        }
        false
    }

    /// Insert `value` right before the `anchor` node
    pub fn insert_before<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        anchor: NodeHandle<T>,
        value: T,
    ) -> UelResult<NodeHandle<T>> {
        let prev = nodes.get(anchor).ok_or(UelError::StaleHandle)?.prev;
        let node = nodes.acquire(ListNode {
            value,
            prev,
            next: Some(anchor),
        })?;

        if let Some(anchor) = nodes.get_mut(anchor) {
            anchor.prev = Some(node);
        }
        match prev {
            Some(prev) => {
                if let Some(prev) = nodes.get_mut(prev) {
                    prev.next = Some(node);
                }
            }
            None => self.head = Some(node),
        }
        self.count += 1;
        Ok(node)
    }

    /// Ordered insertion.
    ///
    /// `value` is placed before the first node for which
    /// `precedes(&value, existing)` holds, or at the tail if none does. A
    /// strict ordering predicate therefore keeps equal elements in insertion
    /// order.
    pub fn insert_sorted<const N: usize, F>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        value: T,
        mut precedes: F,
    ) -> UelResult<NodeHandle<T>>
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let node = nodes.get(current).ok_or(UelError::StaleHandle)?;
            if precedes(&value, &node.value) {
                return self.insert_before(nodes, current, value);
            }
            cursor = node.next;
        }
        self.push_tail(nodes, value)
    }

    /// Unlink `node` from the list and release it back to the pool.
    ///
    /// Nodes of other lists sharing the pool are rejected with
    /// [`UelError::StaleHandle`].
    pub fn remove<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        node: NodeHandle<T>,
    ) -> UelResult<T> {
        if !self.contains(nodes, node) {
            return Err(UelError::StaleHandle);
        }
        self.unlink(nodes, node)
    }

    fn unlink<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        node: NodeHandle<T>,
    ) -> UelResult<T> {
        let (prev, next) = nodes
            .get(node)
            .map(|n| (n.prev, n.next))
            .ok_or(UelError::StaleHandle)?;

        match prev {
            Some(prev) => {
                if let Some(prev) = nodes.get_mut(prev) {
                    prev.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(next) = nodes.get_mut(next) {
                    next.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        self.count -= 1;

        nodes.release(node).map(|n| n.value)
    }

    /// Release every node back to the pool
    pub fn clear<const N: usize>(&mut self, nodes: &mut ObjectPool<ListNode<T>, N>) {
        while self.pop_head(nodes).is_some() {}
        self.head = None;
        self.tail = None;
        self.count = 0;
    }

    /// Iterate over values from head to tail
    pub fn iter<'p, const N: usize>(&self, nodes: &'p ObjectPool<ListNode<T>, N>) -> Iter<'p, T, N> {
        Iter {
            nodes,
            cursor: self.head,
            remaining: self.count,
        }
    }

    fn push_first<const N: usize>(
        &mut self,
        nodes: &mut ObjectPool<ListNode<T>, N>,
        value: T,
    ) -> UelResult<NodeHandle<T>> {
        let node = nodes.acquire(ListNode {
            value,
            prev: None,
            next: None,
        })?;
        self.head = Some(node);
        self.tail = Some(node);
        self.count = 1;
        Ok(node)
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedList")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("count", &self.count)
            .finish()
    }
}

/// Iterator over the values of a [`LinkedList`]
pub struct Iter<'p, T, const N: usize> {
    nodes: &'p ObjectPool<ListNode<T>, N>,
    cursor: Option<NodeHandle<T>>,
    remaining: usize,
}

impl<'p, T, const N: usize> Iterator for Iter<'p, T, N> {
    type Item = &'p T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Nodes = ObjectPool<ListNode<u32>, 8>;

    fn collect(list: &LinkedList<u32>, nodes: &Nodes) -> heapless::Vec<u32, 8> {
        list.iter(nodes).copied().collect()
    }

    #[test]
    fn test_push_both_ends() {
        let mut nodes = Nodes::new();
        let mut list = LinkedList::new();

        list.push_tail(&mut nodes, 2).unwrap();
        list.push_tail(&mut nodes, 3).unwrap();
        list.push_head(&mut nodes, 1).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(collect(&list, &nodes).as_slice(), &[1, 2, 3]);
        assert_eq!(list.peek_head(&nodes), Some(&1));
        assert_eq!(list.peek_tail(&nodes), Some(&3));
        assert_eq!(nodes.available(), 5);
    }

    #[test]
    fn test_pop_releases_nodes() {
        let mut nodes = Nodes::new();
        let mut list = LinkedList::new();
        for i in 0..4 {
            list.push_tail(&mut nodes, i).unwrap();
        }

        assert_eq!(list.pop_head(&mut nodes), Some(0));
        assert_eq!(list.pop_tail(&mut nodes), Some(3));
        assert_eq!(collect(&list, &nodes).as_slice(), &[1, 2]);
        assert_eq!(nodes.available(), 6);

        list.clear(&mut nodes);
        assert!(list.is_empty());
        assert_eq!(list.pop_head(&mut nodes), None);
        assert_eq!(nodes.available(), 8);
    }

    #[test]
    fn test_insert_sorted_is_stable() {
        let mut nodes: ObjectPool<ListNode<(u32, char)>, 8> = ObjectPool::new();
        let mut list = LinkedList::new();
        let by_key = |a: &(u32, char), b: &(u32, char)| a.0 < b.0;

        for item in [(20, 'a'), (10, 'b'), (20, 'c'), (5, 'd'), (10, 'e')] {
            list.insert_sorted(&mut nodes, item, by_key).unwrap();
        }

        let order: heapless::Vec<char, 8> = list.iter(&nodes).map(|item| item.1).collect();
        assert_eq!(order.as_slice(), &['d', 'b', 'e', 'a', 'c']);
    }

    #[test]
    fn test_remove_middle_node() {
        let mut nodes = Nodes::new();
        let mut list = LinkedList::new();
        list.push_tail(&mut nodes, 1).unwrap();
        let middle = list.push_tail(&mut nodes, 2).unwrap();
        list.push_tail(&mut nodes, 3).unwrap();

        assert_eq!(list.remove(&mut nodes, middle), Ok(2));
        assert_eq!(collect(&list, &nodes).as_slice(), &[1, 3]);
        assert_eq!(list.remove(&mut nodes, middle), Err(UelError::StaleHandle));

        let head = list.head().unwrap();
        let next = list.next_of(&nodes, head).unwrap();
        assert_eq!(nodes.get(next).map(ListNode::value), Some(&3));
    }

    #[test]
    fn test_remove_rejects_nodes_of_another_list() {
        let mut nodes = Nodes::new();
        let mut empty = LinkedList::new();
        let mut short = LinkedList::new();
        let mut long = LinkedList::new();
        short.push_tail(&mut nodes, 1).unwrap();
        long.push_tail(&mut nodes, 10).unwrap();
        let middle = long.push_tail(&mut nodes, 20).unwrap();
        long.push_tail(&mut nodes, 30).unwrap();

        assert!(long.contains(&nodes, middle));
        assert!(!short.contains(&nodes, middle));
        assert_eq!(empty.remove(&mut nodes, middle), Err(UelError::StaleHandle));
        assert_eq!(short.remove(&mut nodes, middle), Err(UelError::StaleHandle));

        assert_eq!((empty.len(), short.len(), long.len()), (0, 1, 3));
        assert_eq!(collect(&long, &nodes).as_slice(), &[10, 20, 30]);
        assert_eq!(collect(&short, &nodes).as_slice(), &[1]);
        assert_eq!(nodes.available(), 4);
    }

    #[test]
    fn test_push_fails_when_nodes_depleted() {
        let mut nodes: ObjectPool<ListNode<u8>, 2> = ObjectPool::new();
        let mut list = LinkedList::new();
        list.push_tail(&mut nodes, 1).unwrap();
        list.push_tail(&mut nodes, 2).unwrap();

        assert_eq!(list.push_tail(&mut nodes, 3), Err(UelError::PoolDepleted));
        assert_eq!(list.len(), 2);
    }
}
