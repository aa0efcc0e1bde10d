use clap::{ArgAction, Parser};
use cordyceps_avl::AvlMap;
use tracing_subscriber::EnvFilter;

/// Builds an AVL tree from the given keys and prints its shape.
///
/// Set `RUST_LOG=cordyceps_avl=trace` to log every rotation.
#[derive(Debug, clap::Parser)]
struct Options {
    /// Keys to insert, in order
    #[clap(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    insert: Vec<i64>,
    /// Keys to remove after all insertions, in order
    #[clap(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    remove: Vec<i64>,
    /// Also print the tree in graphviz format
    #[clap(long, action = ArgAction::SetTrue)]
    dot: bool,
    /// Name of the emitted graph
    #[clap(long, env = "AVL_DEMO_NAME", default_value = "avl")]
    name: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Options::parse();
    tracing::debug!(?opts);

    let mut map = AvlMap::new();

    for (seq, &key) in opts.insert.iter().enumerate() {
        if let Some(prev) = map.insert(key, seq) {
            tracing::info!(key, prev, seq, "overwrote existing key");
        }
        map.assert_invariants();
    }

    for key in &opts.remove {
        if map.remove(key).is_none() {
            tracing::info!(key, "key not present");
        }
        map.assert_invariants();
    }

    println!("{:?}", map.keys().collect::<Vec<_>>());
    match map.height() {
        Some(height) => println!("height: {height}"),
        None => println!("height: empty"),
    }
    println!("leaf depths equal: {}", map.leaf_depths_equal());

    if opts.dot {
        let mut out = String::new();
        if let Err(err) = map.dotgraph(&opts.name, &mut out) {
            tracing::error!(%err, "failed to render tree");
            std::process::exit(1);
        }
        println!("{out}");
    }
}
