//! Process tree assembly.
//!
//! The flat snapshot becomes an arena of nodes linked through
//! parent/first-child/next-sibling handles. The arena owns every node for
//! the life of the program; `parent` handles are non-owning back references
//! used only for reads, so the whole structure drops in one piece.

mod compact;
mod sort;

pub use compact::MatchOptions;

use crate::model::ProcessRecord;

/// Handle to a node in a [`ProcessTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// A process record with its tree topology links.
#[derive(Debug)]
struct TreeNode {
    record: ProcessRecord,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    /// Memoized size of the subtree rooted here, including the node itself.
    descendants: Option<u32>,
    /// True once the child chain has been put into display order.
    sorted: bool,
}

impl TreeNode {
    fn new(record: ProcessRecord) -> Self {
        Self {
            record,
            parent: None,
            first_child: None,
            next_sibling: None,
            descendants: None,
            sorted: false,
        }
    }
}

/// Error type for tree assembly failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// The snapshot contained no records at all.
    Empty,
    /// No record with pid 1 was present to anchor the tree.
    NoRoot,
    /// Two records shared a pid.
    DuplicatePid(u32),
}

impl std::fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblyError::Empty => write!(f, "snapshot contains no processes"),
            AssemblyError::NoRoot => write!(f, "no root process (pid 1) in snapshot"),
            AssemblyError::DuplicatePid(pid) => write!(f, "duplicate pid {} in snapshot", pid),
        }
    }
}

impl std::error::Error for AssemblyError {}

/// Rooted forest of processes: the pid 1 tree first, then one tree per
/// record whose parent was never captured, chained as top-level siblings.
#[derive(Debug)]
pub struct ProcessTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl ProcessTree {
    /// Builds the tree from one snapshot of records.
    pub fn assemble(mut records: Vec<ProcessRecord>) -> Result<Self, AssemblyError> {
        if records.is_empty() {
            return Err(AssemblyError::Empty);
        }

        // Pid-sorted arena: lookup is a binary search, and child chains come
        // out in pid order before any display sort runs.
        records.sort_by_key(|r| r.pid);
        if let Some(pair) = records.windows(2).find(|w| w[0].pid == w[1].pid) {
            return Err(AssemblyError::DuplicatePid(pair[0].pid));
        }
        let mut nodes: Vec<TreeNode> = records.into_iter().map(TreeNode::new).collect();

        // Link every record under its parent, appending at the tail of the
        // child chain so pre-sort order stays deterministic. Passes repeat
        // until one makes no progress, so record order never matters. A
        // record whose parent pid is itself or names no captured record
        // stays unlinked and becomes a root candidate.
        let mut placed = vec![false; nodes.len()];
        loop {
            let mut progress = false;
            for i in 0..nodes.len() {
                if placed[i] {
                    continue;
                }
                let pid = nodes[i].record.pid;
                let ppid = nodes[i].record.parent_pid;
                let parent = if ppid == pid {
                    None
                } else {
                    nodes.binary_search_by_key(&ppid, |n| n.record.pid).ok()
                };
                if let Some(p) = parent {
                    nodes[i].parent = Some(NodeId(p));
                    append_child(&mut nodes, p, i);
                }
                placed[i] = true;
                progress = true;
            }
            if !progress || placed.iter().all(|&done| done) {
                break;
            }
        }

        let mut root: Option<usize> = None;
        let mut orphans: Vec<usize> = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            if node.parent.is_none() {
                if node.record.pid == 1 {
                    root = Some(i);
                } else {
                    orphans.push(i);
                }
            }
        }
        let Some(root) = root else {
            return Err(AssemblyError::NoRoot);
        };

        // Orphans surface as additional top-level trees behind the root,
        // in pid order.
        let mut tail = root;
        for i in orphans {
            nodes[tail].next_sibling = Some(NodeId(i));
            tail = i;
        }

        Ok(Self {
            nodes,
            root: NodeId(root),
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by pid.
    pub fn find(&self, pid: u32) -> Option<NodeId> {
        self.nodes
            .binary_search_by_key(&pid, |n| n.record.pid)
            .ok()
            .map(NodeId)
    }

    pub fn record(&self, id: NodeId) -> &ProcessRecord {
        &self.nodes[id.0].record
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    /// Size of the subtree rooted at `id`, the node itself included.
    /// Computed once per node, then memoized.
    pub fn descendant_count(&mut self, id: NodeId) -> u32 {
        if let Some(count) = self.nodes[id.0].descendants {
            return count;
        }
        let mut total = 1;
        let mut child = self.nodes[id.0].first_child;
        while let Some(c) = child {
            total += self.descendant_count(c);
            child = self.nodes[c.0].next_sibling;
        }
        self.nodes[id.0].descendants = Some(total);
        total
    }

    /// Every node owned by `uid` whose parent is absent or owned by someone
    /// else, in pid order. These are the top-level trees rendered when a
    /// username is the target.
    pub fn owned_roots(&self, uid: u32) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| {
                let node = &self.nodes[id.0];
                node.record.uid == uid
                    && node
                        .parent
                        .is_none_or(|p| self.nodes[p.0].record.uid != uid)
            })
            .collect()
    }

    fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }
}

fn append_child(nodes: &mut [TreeNode], parent: usize, child: usize) {
    match nodes[parent].first_child {
        None => nodes[parent].first_child = Some(NodeId(child)),
        Some(first) => {
            let mut tail = first.0;
            while let Some(next) = nodes[tail].next_sibling {
                tail = next.0;
            }
            nodes[tail].next_sibling = Some(NodeId(child));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pid: u32, parent_pid: u32, name: &str) -> ProcessRecord {
        ProcessRecord {
            pid,
            parent_pid,
            name: name.to_string(),
            state: 'S',
            ..Default::default()
        }
    }

    fn child_pids(tree: &ProcessTree, id: NodeId) -> Vec<u32> {
        let mut pids = Vec::new();
        let mut child = tree.first_child(id);
        while let Some(c) = child {
            pids.push(tree.record(c).pid);
            child = tree.next_sibling(c);
        }
        pids
    }

    #[test]
    fn assembles_reachable_tree() {
        let records = vec![
            rec(3, 2, "bash"),
            rec(1, 1, "init"),
            rec(4, 2, "bash"),
            rec(2, 1, "sshd"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let root = tree.root();
        assert_eq!(tree.record(root).pid, 1);
        assert_eq!(child_pids(&tree, root), vec![2]);

        let sshd = tree.find(2).unwrap();
        assert_eq!(child_pids(&tree, sshd), vec![3, 4]);
        assert_eq!(tree.parent(sshd), Some(root));

        // every record is in the root's subtree
        assert_eq!(tree.descendant_count(root), 4);
    }

    #[test]
    fn children_append_in_pid_order() {
        // scan order scrambled on purpose; the arena sorts by pid first
        let records = vec![
            rec(9, 1, "c"),
            rec(1, 1, "init"),
            rec(5, 1, "a"),
            rec(7, 1, "b"),
        ];
        let tree = ProcessTree::assemble(records).unwrap();
        assert_eq!(child_pids(&tree, tree.root()), vec![5, 7, 9]);
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        assert_eq!(
            ProcessTree::assemble(Vec::new()).unwrap_err(),
            AssemblyError::Empty
        );
    }

    #[test]
    fn duplicate_pid_is_rejected() {
        let records = vec![rec(1, 1, "init"), rec(2, 1, "a"), rec(2, 1, "b")];
        assert_eq!(
            ProcessTree::assemble(records).unwrap_err(),
            AssemblyError::DuplicatePid(2)
        );
    }

    #[test]
    fn missing_pid_1_is_rejected() {
        let records = vec![rec(2, 1, "a"), rec(3, 2, "b")];
        assert_eq!(
            ProcessTree::assemble(records).unwrap_err(),
            AssemblyError::NoRoot
        );
    }

    #[test]
    fn orphan_becomes_top_level_tree() {
        let records = vec![rec(1, 1, "init"), rec(2, 1, "sshd"), rec(900, 888, "stray")];
        let tree = ProcessTree::assemble(records).unwrap();

        let root = tree.root();
        assert_eq!(child_pids(&tree, root), vec![2]);

        let orphan = tree.next_sibling(root).unwrap();
        assert_eq!(tree.record(orphan).pid, 900);
        assert_eq!(tree.parent(orphan), None);
        assert_eq!(tree.next_sibling(orphan), None);
    }

    #[test]
    fn self_parented_record_is_not_a_cycle() {
        let records = vec![rec(1, 1, "init"), rec(42, 42, "looper")];
        let tree = ProcessTree::assemble(records).unwrap();

        let looper = tree.find(42).unwrap();
        assert_eq!(tree.parent(looper), None);
        assert_eq!(tree.next_sibling(tree.root()), Some(looper));
    }

    #[test]
    fn descendant_counts_match_subtree_sizes() {
        let records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "sshd"),
            rec(3, 2, "bash"),
            rec(4, 3, "vim"),
            rec(5, 1, "getty"),
        ];
        let mut tree = ProcessTree::assemble(records).unwrap();

        let sshd = tree.find(2).unwrap();
        assert_eq!(tree.descendant_count(sshd), 3);
        assert_eq!(tree.descendant_count(tree.root()), 5);
        // memoized result is stable
        assert_eq!(tree.descendant_count(sshd), 3);
    }

    #[test]
    fn owned_roots_follow_ownership_transitions() {
        let mut records = vec![
            rec(1, 1, "init"),
            rec(2, 1, "sshd"),
            rec(3, 2, "bash"),
            rec(4, 3, "vim"),
            rec(900, 888, "stray"),
        ];
        for r in &mut records {
            r.uid = match r.pid {
                3 | 4 | 900 => 1000,
                _ => 0,
            };
        }
        let tree = ProcessTree::assemble(records).unwrap();

        let roots: Vec<u32> = tree
            .owned_roots(1000)
            .iter()
            .map(|&id| tree.record(id).pid)
            .collect();
        // bash starts the owned subtree, vim is inside it, the orphan has
        // no parent at all
        assert_eq!(roots, vec![3, 900]);

        assert!(tree.owned_roots(4242).is_empty());
    }
}
