//! Recursive branch rendering.
//!
//! The tree prints depth first. In the default layout the first entry of a
//! child group continues its parent's line (`-+-` when more entries follow,
//! `---` for an only entry) and later entries start fresh lines whose
//! prefix is rebuilt from a stack of active connector columns: `|` while
//! the branch continues below, `` ` `` exactly once where it ends, blank
//! after that. With command-line display every entry gets its own line.

mod clip;
mod cmdline;

pub use clip::ClipWriter;
pub use cmdline::format_cmdline;

use crate::tree::{MatchOptions, NodeId, ProcessTree};
use crate::users::{UserLookup, UserTable};
use std::io::{self, Write};

/// Display options for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Show full command lines, one entry per output line.
    pub show_args: bool,
    /// Fold runs of identical sibling subtrees into counted entries.
    pub compact: bool,
    /// Sort sibling chains into display order.
    pub sort: bool,
    /// Annotate every entry with its pid.
    pub show_pids: bool,
    /// Annotate entries whose owner differs from their parent's owner.
    pub show_users: bool,
    /// Escape literal spaces inside arguments as `\040`.
    pub escape_spaces: bool,
    /// Clip output lines at this many bytes; 0 leaves lines unclipped.
    pub width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_args: false,
            compact: true,
            sort: true,
            show_pids: false,
            show_users: false,
            escape_spaces: false,
            width: 0,
        }
    }
}

/// Connector drawn at one active ancestor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    /// The branch continues on lines below.
    Bar,
    /// The branch ends here; drawn once, then the column goes blank.
    Corner,
    /// No connector, keep the column as spacing.
    Blank,
}

#[derive(Debug)]
struct Column {
    col: usize,
    glyph: Glyph,
}

/// A maximal group of adjacent siblings that render as one entry.
struct Run {
    head: NodeId,
    count: usize,
}

/// Prints a process tree to a byte sink.
pub struct Renderer<'a, U: UserLookup, W: Write> {
    tree: &'a mut ProcessTree,
    users: &'a mut UserTable<U>,
    opts: RenderOptions,
    out: ClipWriter<W>,
    columns: Vec<Column>,
}

impl<'a, U: UserLookup, W: Write> Renderer<'a, U, W> {
    pub fn new(
        tree: &'a mut ProcessTree,
        users: &'a mut UserTable<U>,
        opts: RenderOptions,
        sink: W,
    ) -> Self {
        Self {
            tree,
            users,
            out: ClipWriter::new(sink, opts.width),
            opts,
            columns: Vec::new(),
        }
    }

    /// Renders the whole forest: the root tree, then any orphan trees
    /// chained behind the root.
    pub fn render_tree(&mut self) -> io::Result<()> {
        let root = self.tree.root();
        self.render_from(root, true)
    }

    /// Renders a single subtree, ignoring the node's siblings.
    pub fn render_subtree(&mut self, id: NodeId) -> io::Result<()> {
        self.render_from(id, false)
    }

    fn render_from(&mut self, head: NodeId, walk: bool) -> io::Result<()> {
        if self.opts.show_args {
            self.chain_lines(head, walk, true)
        } else {
            self.chain_inline(Some(head), walk, true)
        }
    }

    /// Default layout: the first entry continues the open line; an empty
    /// chain just terminates it.
    fn chain_inline(&mut self, head: Option<NodeId>, walk: bool, top: bool) -> io::Result<()> {
        if head.is_none() {
            return self.out.newline();
        }
        let runs = self.collect_runs(head, walk);
        let multi = runs.len() > 1;

        for (i, run) in runs.iter().enumerate() {
            let first = i == 0;
            let last = i + 1 == runs.len();
            if !top {
                if first {
                    self.out.put_str("-")?;
                    self.columns.push(Column {
                        col: self.out.col(),
                        glyph: if multi { Glyph::Bar } else { Glyph::Blank },
                    });
                    self.out.put_str(if multi { "+-" } else { "--" })?;
                } else {
                    if last && let Some(own) = self.columns.last_mut() {
                        own.glyph = Glyph::Corner;
                    }
                    self.draw_prefix()?;
                    self.out.put_str("-")?;
                }
            }

            self.emit_entry(run)?;
            let kids = self.children(run.head);
            self.chain_inline(kids, true, false)?;
        }

        if !top {
            self.columns.pop();
        }
        Ok(())
    }

    /// Command-line layout: one entry per line, children indented one
    /// column right of their parent.
    fn chain_lines(&mut self, head: NodeId, walk: bool, top: bool) -> io::Result<()> {
        let runs = self.collect_runs(Some(head), walk);

        for (i, run) in runs.iter().enumerate() {
            let last = i + 1 == runs.len();
            if !top {
                if last && let Some(own) = self.columns.last_mut() {
                    own.glyph = Glyph::Corner;
                }
                self.draw_prefix()?;
                self.out.put_str("-")?;
            }

            let entry_col = self.out.col();
            self.emit_entry(run)?;
            self.out.newline()?;

            if let Some(kids) = self.children(run.head) {
                self.columns.push(Column {
                    col: entry_col + 1,
                    glyph: Glyph::Bar,
                });
                self.chain_lines(kids, true, false)?;
                self.columns.pop();
            }
        }
        Ok(())
    }

    /// Sorted (or raw, with sorting off) child chain of `id`.
    fn children(&mut self, id: NodeId) -> Option<NodeId> {
        if self.opts.sort {
            self.tree.sort_children(id)
        } else {
            self.tree.first_child(id)
        }
    }

    /// Groups a sibling chain into display runs. Each successive sibling is
    /// tested against the head of the open run; matches extend the run and
    /// its displayed count. A targeted render (`walk` off) is always a
    /// single run of one: the target never absorbs its siblings.
    fn collect_runs(&self, head: Option<NodeId>, walk: bool) -> Vec<Run> {
        let matching = MatchOptions {
            match_pids: self.opts.show_pids,
            match_args: self.opts.show_args,
        };

        let mut runs = Vec::new();
        let mut cur = head;
        while let Some(h) = cur {
            let mut count = 1;
            let mut next = self.tree.next_sibling(h);
            if self.opts.compact && walk {
                while let Some(s) = next {
                    if !self.tree.same_subtree(Some(h), Some(s), false, &matching) {
                        break;
                    }
                    count += 1;
                    next = self.tree.next_sibling(s);
                }
            }
            runs.push(Run { head: h, count });
            if !walk {
                break;
            }
            cur = next;
        }
        runs
    }

    /// Draws the stacked ancestor connectors for a fresh line. A corner
    /// reverts to blank the moment it has been drawn.
    fn draw_prefix(&mut self) -> io::Result<()> {
        let Self { columns, out, .. } = self;
        for column in columns.iter_mut() {
            out.pad_to(column.col)?;
            match column.glyph {
                Glyph::Bar => out.put_str("|")?,
                Glyph::Corner => {
                    out.put_str("`")?;
                    column.glyph = Glyph::Blank;
                }
                Glyph::Blank => out.put_str(" ")?,
            }
        }
        Ok(())
    }

    /// One displayed entry: optional `N*[` multiplier, the name or command
    /// line, `]`, then parenthesized annotations.
    fn emit_entry(&mut self, run: &Run) -> io::Result<()> {
        if run.count > 1 {
            self.out.put_str(&format!("{}*[", run.count))?;
        }

        let name: Vec<u8> = {
            let record = self.tree.record(run.head);
            match (&record.cmdline, self.opts.show_args) {
                (Some(cmd), true) => format_cmdline(cmd, record.renamed, self.opts.escape_spaces),
                _ => record.name.clone().into_bytes(),
            }
        };
        self.out.put_bytes(&name)?;

        if run.count > 1 {
            self.out.put_str("]")?;
        }
        self.emit_annotations(run.head)
    }

    fn emit_annotations(&mut self, id: NodeId) -> io::Result<()> {
        let pid = self.tree.record(id).pid;
        let uid = self.tree.record(id).uid;
        let parent_uid = self.tree.parent(id).map(|p| self.tree.record(p).uid);

        let mut parts: Vec<String> = Vec::new();
        if self.opts.show_pids {
            parts.push(pid.to_string());
        }
        if self.opts.show_users && parent_uid.is_some_and(|p| p != uid) {
            parts.push(self.users.display(uid));
        }

        if parts.is_empty() {
            Ok(())
        } else {
            self.out.put_str(&format!("({})", parts.join(",")))
        }
    }
}
