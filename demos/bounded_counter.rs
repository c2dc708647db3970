use clap::Parser;

use bdd_reach::bdd::Bdd;
use bdd_reach::reach::{BfsOptions, TransitionSystem};
use bdd_reach::varset::VarSet;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of counter bits.
    #[arg(value_name = "INT", default_value = "8")]
    bits: u32,

    /// Node table size (in bits, so the actual size is `2^size` cells).
    #[clap(long, value_name = "INT", default_value = "20")]
    size: usize,

    /// Count the states discovered at each BFS level.
    #[clap(long)]
    count: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let bdd = Bdd::new(args.size, 16);
    println!("bdd = {:?}", bdd);

    // An n-bit ripple counter. Bit k lives on the pair (2k-1, 2k) and flips
    // exactly when all lower bits are set.
    let n = args.bits;
    println!("Encoding a {}-bit counter", n);

    let mut rel = bdd.protect(bdd.one());
    let mut carry = bdd.protect(bdd.one());
    for k in 1..=n {
        let cur = bdd.protect(bdd.mk_var(2 * k - 1));
        let nxt = bdd.protect(bdd.mk_var(2 * k));
        let flip = bdd.protect(bdd.apply_xor(cur.node(), carry.node()));
        let bit = bdd.protect(bdd.apply_eq(nxt.node(), flip.node()));
        rel.rebind(bdd.apply_and(rel.node(), bit.node()));
        carry.rebind(bdd.apply_and(carry.node(), cur.node()));
    }
    drop(carry);
    println!("relation has {} nodes", bdd.node_count(rel.node()));

    let initial = bdd.cube((1..=n).map(|k| -((2 * k - 1) as i32)));
    let domain: VarSet = (1..=n).map(|k| 2 * k - 1).collect();

    let mut ts = TransitionSystem::new(&bdd, initial, domain);
    ts.add_group(rel.node(), (1..=2 * n).collect());
    drop(rel);

    println!("Running BFS...");
    let visited = ts.bfs_with(&BfsOptions {
        count_states: args.count,
    });

    println!("bdd = {:?}", bdd);
    println!(
        "reachable states: {}",
        bdd.sat_count(visited.node(), ts.domain())
    );
    println!("visited set has {} nodes", bdd.node_count(visited.node()));

    let (hits, misses) = bdd.cache_stats();
    println!("cache hits: {}", hits);
    println!("cache misses: {}", misses);

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
