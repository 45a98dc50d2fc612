//! Structural subtree equality, the basis for folding repeated siblings
//! into one counted entry.

use super::{NodeId, ProcessTree};

/// Which record details must match, beyond name and shape, for two subtrees
/// to count as the same. Derived from the display options: whatever the
/// output would show must match before entries may fold together.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Pids are displayed; distinct processes never fold.
    pub match_pids: bool,
    /// Command lines are displayed; argument bytes and rename state must
    /// match exactly.
    pub match_args: bool,
}

impl ProcessTree {
    /// Tests whether `a` and `b` are the same subtree: exact name match,
    /// matching details per `options`, and recursively identical child
    /// chains. With `walk_siblings` the comparison continues pairwise down
    /// both `next_sibling` chains, which then must end together.
    ///
    /// A node is always the same as itself, and the relation is symmetric.
    pub fn same_subtree(
        &self,
        a: Option<NodeId>,
        b: Option<NodeId>,
        walk_siblings: bool,
        options: &MatchOptions,
    ) -> bool {
        let (x, y) = match (a, b) {
            (None, None) => return true,
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };

        if x == y {
            return true;
        }
        // distinct nodes never share a pid
        if options.match_pids {
            return false;
        }

        let rx = &self.node(x).record;
        let ry = &self.node(y).record;
        if rx.name != ry.name {
            return false;
        }
        if options.match_args && (rx.renamed != ry.renamed || rx.cmdline != ry.cmdline) {
            return false;
        }

        // the entire child chain must match, not just its head
        if !self.same_subtree(
            self.node(x).first_child,
            self.node(y).first_child,
            true,
            options,
        ) {
            return false;
        }

        if walk_siblings {
            self.same_subtree(
                self.node(x).next_sibling,
                self.node(y).next_sibling,
                true,
                options,
            )
        } else {
            true
        }
    }
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

    fn build(records: Vec<ProcessRecord>) -> ProcessTree {
        ProcessTree::assemble(records).unwrap()
    }

    #[test]
    fn node_is_same_as_itself() {
        let tree = build(vec![rec(1, 1, "init"), rec(2, 1, "a"), rec(3, 2, "b")]);
        let opts = MatchOptions::default();

        for pid in [1, 2, 3] {
            let id = tree.find(pid).unwrap();
            assert!(tree.same_subtree(Some(id), Some(id), true, &opts));
        }
        assert!(tree.same_subtree(None, None, true, &opts));
    }

    #[test]
    fn identical_leaves_match_symmetrically() {
        let tree = build(vec![rec(1, 1, "init"), rec(3, 1, "bash"), rec(4, 1, "bash")]);
        let opts = MatchOptions::default();
        let a = tree.find(3).unwrap();
        let b = tree.find(4).unwrap();

        assert!(tree.same_subtree(Some(a), Some(b), false, &opts));
        assert!(tree.same_subtree(Some(b), Some(a), false, &opts));
    }

    #[test]
    fn name_comparison_is_case_sensitive() {
        let tree = build(vec![rec(1, 1, "init"), rec(3, 1, "bash"), rec(4, 1, "Bash")]);
        let a = tree.find(3).unwrap();
        let b = tree.find(4).unwrap();
        assert!(!tree.same_subtree(Some(a), Some(b), false, &MatchOptions::default()));
    }

    #[test]
    fn child_chains_must_match_entirely() {
        let tree = build(vec![
            rec(1, 1, "init"),
            rec(2, 1, "sshd"),
            rec(3, 1, "sshd"),
            rec(4, 2, "bash"),
            rec(5, 3, "bash"),
            rec(6, 3, "scp"),
        ]);
        let opts = MatchOptions::default();
        let a = tree.find(2).unwrap();
        let b = tree.find(3).unwrap();

        // pid 3 has an extra child, so the chains end at different points
        assert!(!tree.same_subtree(Some(a), Some(b), false, &opts));
    }

    #[test]
    fn equal_subtrees_with_children_match() {
        let tree = build(vec![
            rec(1, 1, "init"),
            rec(2, 1, "sshd"),
            rec(3, 1, "sshd"),
            rec(4, 2, "bash"),
            rec(5, 3, "bash"),
        ]);
        let a = tree.find(2).unwrap();
        let b = tree.find(3).unwrap();
        assert!(tree.same_subtree(Some(a), Some(b), false, &MatchOptions::default()));
    }

    #[test]
    fn sibling_walk_requires_chains_to_end_together() {
        let tree = build(vec![
            rec(1, 1, "init"),
            rec(2, 1, "a"),
            rec(3, 1, "a"),
            rec(4, 1, "a"),
        ]);
        let opts = MatchOptions::default();
        let first = tree.find(2).unwrap();
        let second = tree.find(3).unwrap();

        // chains [2,3,4] and [3,4] have different lengths
        assert!(!tree.same_subtree(Some(first), Some(second), true, &opts));
        // without the sibling walk the heads are the same subtree
        assert!(tree.same_subtree(Some(first), Some(second), false, &opts));
    }

    #[test]
    fn pid_matching_blocks_distinct_processes() {
        let tree = build(vec![rec(1, 1, "init"), rec(3, 1, "bash"), rec(4, 1, "bash")]);
        let opts = MatchOptions {
            match_pids: true,
            ..Default::default()
        };
        let a = tree.find(3).unwrap();
        let b = tree.find(4).unwrap();

        assert!(!tree.same_subtree(Some(a), Some(b), false, &opts));
        assert!(tree.same_subtree(Some(a), Some(a), false, &opts));
    }

    #[test]
    fn argument_matching_compares_cmdline_bytes() {
        let mut one = rec(3, 1, "bash");
        one.cmdline = Some(b"bash\0-l".to_vec());
        let mut two = rec(4, 1, "bash");
        two.cmdline = Some(b"bash\0-i".to_vec());

        let tree = build(vec![rec(1, 1, "init"), one, two]);
        let a = tree.find(3).unwrap();
        let b = tree.find(4).unwrap();

        assert!(tree.same_subtree(Some(a), Some(b), false, &MatchOptions::default()));
        assert!(!tree.same_subtree(
            Some(a),
            Some(b),
            false,
            &MatchOptions {
                match_args: true,
                ..Default::default()
            }
        ));
    }
}
