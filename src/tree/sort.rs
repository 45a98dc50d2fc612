//! Sibling display ordering.
//!
//! Names compare case-insensitively in descending order, so `Xorg` renders
//! ahead of `sshd`; ties break case-sensitively, then by subtree shape,
//! finally by pid. The same order makes identical subtrees adjacent, which
//! is what allows them to fold into counted entries.

use super::{NodeId, ProcessTree};
use std::cmp::Ordering;

impl ProcessTree {
    /// Puts the child chain of `id` into display order and returns its new
    /// head. Sorting only relinks `next_sibling` handles, never ownership;
    /// the result is memoized per node.
    pub fn sort_children(&mut self, id: NodeId) -> Option<NodeId> {
        if !self.node(id).sorted {
            let head = self.node(id).first_child;
            let sorted = self.sort_chain(head);
            let node = self.node_mut(id);
            node.first_child = sorted;
            node.sorted = true;
        }
        self.node(id).first_child
    }

    /// Total display order over siblings: `Less` renders first.
    ///
    /// Tiers, each breaking ties of the previous: case-insensitive name,
    /// case-sensitive name, subtree size, children pairwise (both chains
    /// sorted first, shorter chain ahead), pid. Distinct nodes always
    /// order strictly, so sorting is deterministic and idempotent.
    pub(crate) fn compare(&mut self, a: NodeId, b: NodeId) -> Ordering {
        let by_name = {
            let an = self.node(a).record.name.as_str();
            let bn = self.node(b).record.name.as_str();
            cmp_ignore_ascii_case(bn, an).then_with(|| bn.cmp(an))
        };
        if by_name != Ordering::Equal {
            return by_name;
        }

        let size_a = self.descendant_count(a);
        let size_b = self.descendant_count(b);
        if size_a != size_b {
            return size_a.cmp(&size_b);
        }

        let mut x = self.sort_children(a);
        let mut y = self.sort_children(b);
        loop {
            match (x, y) {
                (None, None) => break,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(cx), Some(cy)) => {
                    let ord = self.compare(cx, cy);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    x = self.node(cx).next_sibling;
                    y = self.node(cy).next_sibling;
                }
            }
        }

        self.node(a).record.pid.cmp(&self.node(b).record.pid)
    }

    /// Merge sort over a singly linked sibling chain: split by alternating
    /// elements, sort the halves, merge. Needs no random access and moves
    /// no nodes, only `next_sibling` links.
    fn sort_chain(&mut self, head: Option<NodeId>) -> Option<NodeId> {
        let Some(first) = head else {
            return None;
        };
        if self.node(first).next_sibling.is_none() {
            return head;
        }

        let mut left = None;
        let mut right = None;
        let mut take_left = true;
        let mut cur = head;
        while let Some(id) = cur {
            let next = self.node(id).next_sibling;
            let half = if take_left { &mut left } else { &mut right };
            self.node_mut(id).next_sibling = *half;
            *half = Some(id);
            take_left = !take_left;
            cur = next;
        }

        let left = self.sort_chain(left);
        let right = self.sort_chain(right);
        self.merge(left, right)
    }

    fn merge(&mut self, mut a: Option<NodeId>, mut b: Option<NodeId>) -> Option<NodeId> {
        let mut head = None;
        let mut tail: Option<NodeId> = None;
        loop {
            let id = match (a, b) {
                (None, None) => break,
                (Some(x), None) => x,
                (None, Some(y)) => y,
                (Some(x), Some(y)) => {
                    if self.compare(x, y) != Ordering::Greater {
                        x
                    } else {
                        y
                    }
                }
            };
            if a == Some(id) {
                a = self.node(id).next_sibling;
            } else {
                b = self.node(id).next_sibling;
            }

            self.node_mut(id).next_sibling = None;
            match tail {
                Some(t) => self.node_mut(t).next_sibling = Some(id),
                None => head = Some(id),
            }
            tail = Some(id);
        }
        head
    }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcessRecord;

    fn rec(pid: u32, parent_pid: u32, name: &str) -> ProcessRecord {
        ProcessRecord {
            pid,
            parent_pid,
            name: name.to_string(),
            state: 'S',
            ..Default::default()
        }
    }

    fn sorted_child_names(tree: &mut ProcessTree, pid: u32) -> Vec<String> {
        let id = tree.find(pid).unwrap();
        let mut head = tree.sort_children(id);
        let mut names = Vec::new();
        while let Some(c) = head {
            names.push(tree.record(c).name.clone());
            head = tree.next_sibling(c);
        }
        names
    }

    #[test]
    fn capitalization_insensitive_order() {
        let records = vec![rec(1, 1, "init"), rec(5, 1, "Xorg"), rec(2, 1, "sshd")];
        let mut tree = ProcessTree::assemble(records).unwrap();
        assert_eq!(sorted_child_names(&mut tree, 1), vec!["Xorg", "sshd"]);
    }

    #[test]
    fn case_sensitive_comparison_stabilizes_ties() {
        let records = vec![rec(1, 1, "init"), rec(2, 1, "Getty"), rec(3, 1, "getty")];
        let mut tree = ProcessTree::assemble(records).unwrap();
        assert_eq!(sorted_child_names(&mut tree, 1), vec!["getty", "Getty"]);
    }

    #[test]
    fn smaller_subtree_sorts_ahead_of_larger() {
        let records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "worker"),
            rec(3, 1, "worker"),
            rec(4, 3, "job"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let head = tree.sort_children(tree.root()).unwrap();
        assert_eq!(tree.record(head).pid, 2);
        let second = tree.next_sibling(head).unwrap();
        assert_eq!(tree.record(second).pid, 3);
    }

    #[test]
    fn equal_sized_subtrees_compare_children_pairwise() {
        let records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "worker"),
            rec(3, 1, "worker"),
            rec(4, 2, "alpha"),
            rec(5, 3, "zeta"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        // zeta outranks alpha in descending name order, so pid 3 leads
        let head = tree.sort_children(tree.root()).unwrap();
        assert_eq!(tree.record(head).pid, 3);
    }

    #[test]
    fn pid_breaks_final_ties() {
        let records = vec![rec(1, 1, "init"), rec(4, 1, "bash"), rec(3, 1, "bash")];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let head = tree.sort_children(tree.root()).unwrap();
        assert_eq!(tree.record(head).pid, 3);
        let second = tree.next_sibling(head).unwrap();
        assert_eq!(tree.record(second).pid, 4);
    }

    #[test]
    fn order_is_strict_on_distinct_nodes() {
        let records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "sshd"),
            rec(3, 1, "Xorg"),
            rec(4, 1, "sshd"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();
        let ids: Vec<NodeId> = [2, 3, 4].iter().map(|&p| tree.find(p).unwrap()).collect();

        for &a in &ids {
            for &b in &ids {
                if a == b {
                    continue;
                }
                let ab = tree.compare(a, b);
                let ba = tree.compare(b, a);
                assert_ne!(ab, Ordering::Equal);
                assert_eq!(ab, ba.reverse());
            }
        }
    }

    #[test]
    fn sorting_is_idempotent() {
        let records = vec![
            rec(1, 1, "init"),
            rec(6, 1, "getty"),
            rec(2, 1, "sshd"),
            rec(5, 1, "Xorg"),
            rec(9, 1, "cron"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let once = sorted_child_names(&mut tree, 1);
        // force a resort of the same chain
        let root = tree.root();
        tree.node_mut(root).sorted = false;
        let twice = sorted_child_names(&mut tree, 1);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn sorting_preserves_chain_integrity() {
        let records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "e"),
            rec(3, 1, "d"),
            rec(4, 1, "a"),
            rec(5, 1, "c"),
            rec(6, 1, "b"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let names = sorted_child_names(&mut tree, 1);
        assert_eq!(names, vec!["e", "d", "c", "b", "a"]);
        assert_eq!(tree.descendant_count(tree.root()), 6);
    }
}
