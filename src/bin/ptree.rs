//! ptree - display running processes as a tree.
//!
//! Usage:
//!   ptree            # tree of every process, root first
//!   ptree 1234       # subtree rooted at pid 1234
//!   ptree alice      # every tree owned by user alice
//!   ptree -a         # full command lines, one process per line
//!   ptree -p -u      # pid and ownership annotations

use std::io::{self, BufWriter, Write};

use clap::Parser;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_os = "linux"))]
use ptree::collector::MockFs;
#[cfg(target_os = "linux")]
use ptree::collector::RealFs;
use ptree::collector::{CollectError, ProcessCollector};
use ptree::model::ProcessRecord;
use ptree::render::{RenderOptions, Renderer};
use ptree::tree::{AssemblyError, NodeId, ProcessTree};
use ptree::users::{SystemUsers, UserTable};
use ptree::util::terminal_width;

/// Display running processes as a tree.
#[derive(Parser)]
#[command(name = "ptree", about = "Display running processes as a tree", version)]
struct Args {
    /// Show full command lines, one process per line.
    #[arg(short = 'a', long = "args")]
    args: bool,

    /// Do not fold identical subtrees into counted entries.
    #[arg(short = 'c', long = "no-compact")]
    no_compact: bool,

    /// Do not clip lines at the terminal width.
    #[arg(short = 'l', long = "long")]
    long: bool,

    /// Keep siblings in pid order instead of display order.
    #[arg(short = 'n', long = "no-sort")]
    no_sort: bool,

    /// Annotate every process with its pid.
    #[arg(short = 'p', long = "pids")]
    pids: bool,

    /// Annotate processes whose owner differs from their parent's owner.
    #[arg(short = 'u', long = "users")]
    users: bool,

    /// Escape spaces inside arguments as \040 (only meaningful with -a).
    #[arg(short = 'e', long = "escape-spaces")]
    escape_spaces: bool,

    /// Path to the proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Pid to start from, or a user name to show every tree that user owns.
    #[arg(value_name = "PID|USER")]
    target: Option<String>,
}

/// Initializes the tracing subscriber. Diagnostics go to stderr so the tree
/// on stdout stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter =
        EnvFilter::from_default_env().add_directive(format!("ptree={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// What the positional argument asks for.
enum Target {
    Pid(u32),
    User(String),
}

fn parse_target(raw: &str) -> Target {
    match raw.parse::<u32>() {
        Ok(pid) => Target::Pid(pid),
        Err(_) => Target::User(raw.to_string()),
    }
}

fn collect_records(args: &Args) -> Result<Vec<ProcessRecord>, CollectError> {
    #[cfg(target_os = "linux")]
    let collector =
        ProcessCollector::new(RealFs::new(), args.proc_path.as_str()).with_args(args.args);
    #[cfg(not(target_os = "linux"))]
    let collector =
        ProcessCollector::new(MockFs::typical_system(), args.proc_path.as_str()).with_args(args.args);

    collector.snapshot()
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let records = match collect_records(&args) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("ptree: cannot read the process table: {}", e);
            if let CollectError::Io(io_err) = &e
                && io_err.kind() == io::ErrorKind::PermissionDenied
            {
                eprintln!("ptree: is {} readable by your user?", args.proc_path);
            }
            std::process::exit(1);
        }
    };

    let mut tree = match ProcessTree::assemble(records) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ptree: {}", e);
            if matches!(e, AssemblyError::Empty | AssemblyError::NoRoot) {
                eprintln!("ptree: is {} mounted and fully readable?", args.proc_path);
            }
            std::process::exit(1);
        }
    };
    debug!("assembled a tree of {} processes", tree.len());

    let opts = RenderOptions {
        show_args: args.args,
        compact: !args.no_compact,
        sort: !args.no_sort,
        show_pids: args.pids,
        show_users: args.users,
        escape_spaces: args.escape_spaces,
        width: if args.long { 0 } else { terminal_width() },
    };

    let mut users = UserTable::new(SystemUsers::new());

    // resolve targets before producing any output
    let targets: Option<Vec<NodeId>> = match args.target.as_deref().map(parse_target) {
        None => None,
        Some(Target::Pid(pid)) => match tree.find(pid) {
            Some(id) => Some(vec![id]),
            None => {
                eprintln!("ptree: no process with pid {}", pid);
                std::process::exit(1);
            }
        },
        Some(Target::User(name)) => match users.uid_for(&name) {
            Some(uid) => {
                let roots = tree.owned_roots(uid);
                if roots.is_empty() {
                    eprintln!("ptree: no processes owned by {}", name);
                    std::process::exit(1);
                }
                Some(roots)
            }
            None => {
                eprintln!("ptree: unknown user {}", name);
                std::process::exit(1);
            }
        },
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = {
        let mut renderer = Renderer::new(&mut tree, &mut users, opts, &mut out);
        match targets {
            None => renderer.render_tree(),
            Some(ids) => ids.iter().try_for_each(|&id| renderer.render_subtree(id)),
        }
    };

    if let Err(e) = result.and_then(|_| out.flush()) {
        // a closed pager is a normal way to stop reading
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("ptree: write error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptree::collector::MockFs;
    use ptree::users::MockUsers;

    #[test]
    fn numeric_target_is_a_pid() {
        assert!(matches!(parse_target("1234"), Target::Pid(1234)));
        assert!(matches!(parse_target("alice"), Target::User(_)));
        // leading zeros still parse as a pid
        assert!(matches!(parse_target("007"), Target::Pid(7)));
    }

    #[test]
    fn snapshot_renders_end_to_end() {
        let collector = ProcessCollector::new(MockFs::typical_system(), "/proc");
        let records = collector.snapshot().unwrap();
        let mut tree = ProcessTree::assemble(records).unwrap();

        let mut users = UserTable::new(MockUsers::new());
        let mut buf = Vec::new();
        Renderer::new(&mut tree, &mut users, RenderOptions::default(), &mut buf)
            .render_tree()
            .unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "init-+-sshd---2*[bash]\n     `-getty\n"
        );
    }
}
