use std::io;
use std::time::{Duration, Instant};

use bsp_tiles::{InsertPosition, LayoutTree, NodeId};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;

/// Compact the arena after this many rewrites.
const COMPACT_EVERY: u64 = 256;

#[derive(Parser, Debug)]
#[command(
    name = "bsp-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Rewrite-heavy benchmark for the BSP layout engine"
)]
struct BenchCli {
    /// How long to run the benchmark.
    #[arg(
        short = 'd',
        long = "duration",
        value_name = "SECONDS",
        default_value_t = 5.0
    )]
    duration_seconds: f64,

    /// Seed for the operation mix and tile colors.
    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,

    /// Upper bound on tiles; beyond it the benchmark only removes.
    #[arg(short = 'm', long = "max-leaves", default_value_t = 512)]
    max_leaves: usize,

    /// Canvas width used for the layout walk.
    #[arg(long, default_value_t = 1920)]
    width: u16,

    /// Canvas height used for the layout walk.
    #[arg(long, default_value_t = 1080)]
    height: u16,
}

struct BenchConfig {
    duration: Duration,
    seed: u64,
    max_leaves: usize,
    area: Rect,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(0.1..=600.0).contains(&cli.duration_seconds) {
            return Err("duration must be between 0.1 and 600 seconds".to_string());
        }
        if !(2..=1_000_000).contains(&cli.max_leaves) {
            return Err("max-leaves must be between 2 and 1000000".to_string());
        }
        if cli.width == 0 || cli.height == 0 {
            return Err("canvas width and height must be at least 1".to_string());
        }
        Ok(Self {
            duration: Duration::from_secs_f64(cli.duration_seconds),
            seed: cli.seed,
            max_leaves: cli.max_leaves,
            area: Rect {
                x: 0,
                y: 0,
                width: cli.width,
                height: cli.height,
            },
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config);
    println!("{}", stats.final_report(&config));
    Ok(())
}

#[derive(Copy, Clone)]
enum Op {
    Split,
    Remove,
    Insert,
}

fn pick_op(rng: &mut SmallRng, leaves: usize, max_leaves: usize) -> Op {
    if leaves >= max_leaves {
        return Op::Remove;
    }
    match rng.random_range(0..10) {
        0..=4 => Op::Split,
        5..=6 => Op::Remove,
        _ => Op::Insert,
    }
}

fn pick_leaf(rng: &mut SmallRng, leaves: &[NodeId]) -> NodeId {
    leaves[rng.random_range(0..leaves.len())]
}

fn run_benchmark(config: &BenchConfig) -> BenchStats {
    let mut stats = BenchStats::new();
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let (mut tree, mut root) = LayoutTree::with_root(&mut rng);

    while stats.elapsed() < config.duration {
        let walk_start = Instant::now();
        let regions = tree.walk(root, config.area);
        stats.record_walk(walk_start.elapsed());

        let leaves: Vec<NodeId> = regions.iter().map(|(id, _)| *id).collect();
        let target = pick_leaf(&mut rng, &leaves);
        let op = pick_op(&mut rng, leaves.len(), config.max_leaves);

        let op_start = Instant::now();
        root = match op {
            Op::Split => {
                let is_vertical = rng.random_bool(0.5);
                tree.split(root, target, is_vertical, &mut rng)
            }
            Op::Remove => tree.remove_node(root, target),
            Op::Insert => {
                let dragging = pick_leaf(&mut rng, &leaves);
                let index = rng.random_range(0..InsertPosition::ALL.len());
                let position = InsertPosition::ALL[index];
                tree.insert_relative(root, target, dragging, position)
            }
        };
        stats.record_op(op, op_start.elapsed(), leaves.len());

        if stats.op_count % COMPACT_EVERY == 0 {
            tree.retain_reachable(&[root]);
        }
    }

    stats.final_leaves = tree.leaf_count(root);
    stats.final_depth = tree.depth(root);
    stats.mark_completed();
    stats
}

struct BenchStats {
    start: Instant,
    completed_at: Option<Instant>,
    op_count: u64,
    splits: u64,
    removes: u64,
    inserts: u64,
    total_op_time: Duration,
    slowest_op: Duration,
    walk_count: u64,
    total_walk_time: Duration,
    peak_leaves: usize,
    final_leaves: usize,
    final_depth: usize,
}

impl BenchStats {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_at: None,
            op_count: 0,
            splits: 0,
            removes: 0,
            inserts: 0,
            total_op_time: Duration::ZERO,
            slowest_op: Duration::ZERO,
            walk_count: 0,
            total_walk_time: Duration::ZERO,
            peak_leaves: 0,
            final_leaves: 0,
            final_depth: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        match self.completed_at {
            Some(done) => done.duration_since(self.start),
            None => self.start.elapsed(),
        }
    }

    fn mark_completed(&mut self) {
        self.completed_at = Some(Instant::now());
    }

    fn record_op(&mut self, op: Op, took: Duration, leaves: usize) {
        self.op_count = self.op_count.saturating_add(1);
        match op {
            Op::Split => self.splits += 1,
            Op::Remove => self.removes += 1,
            Op::Insert => self.inserts += 1,
        }
        self.total_op_time += took;
        if took > self.slowest_op {
            self.slowest_op = took;
        }
        self.peak_leaves = self.peak_leaves.max(leaves);
    }

    fn record_walk(&mut self, took: Duration) {
        self.walk_count = self.walk_count.saturating_add(1);
        self.total_walk_time += took;
    }

    fn average_op_us(&self) -> f64 {
        if self.op_count == 0 {
            return 0.0;
        }
        (self.total_op_time.as_secs_f64() / self.op_count as f64) * 1_000_000.0
    }

    fn average_walk_us(&self) -> f64 {
        if self.walk_count == 0 {
            return 0.0;
        }
        (self.total_walk_time.as_secs_f64() / self.walk_count as f64) * 1_000_000.0
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        let elapsed = self.elapsed().as_secs_f64();
        let ops_per_second = if elapsed > 0.0 {
            self.op_count as f64 / elapsed
        } else {
            0.0
        };

        indoc::formatdoc!(
            r#"
            Layout bench completed (seed {seed}).
            Duration: {elapsed:.2}s (target {target:.2}s)
            Rewrites: {ops} (~{ops_per_sec:.0}/s) | split {splits} | remove {removes} | insert {inserts}
            Avg rewrite: {avg_op:.2} us | Worst: {worst_op:.2} us
            Avg walk: {avg_walk:.2} us over {walks} walks
            Leaves: peak {peak} | final {leaves} at depth {depth}
            "#,
            seed = config.seed,
            elapsed = elapsed,
            target = config.duration.as_secs_f64(),
            ops = self.op_count,
            ops_per_sec = ops_per_second,
            splits = self.splits,
            removes = self.removes,
            inserts = self.inserts,
            avg_op = self.average_op_us(),
            worst_op = self.slowest_op.as_secs_f64() * 1_000_000.0,
            avg_walk = self.average_walk_us(),
            walks = self.walk_count,
            peak = self.peak_leaves,
            leaves = self.final_leaves,
            depth = self.final_depth,
        )
    }
}
