//! Replay a list of leaf insertions into a fresh tree and print its snapshot.
//!
//! Usage: `tree-replay <config.toml|-> [leaf...]`, leaves as decimal field
//! elements. `-` selects the default configuration.

use accumulator_crypto::field::from_decimal;
use accumulator_tree::{Mimc7, TreeConfig, TreeError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn run(args: &[String]) -> Result<String, TreeError> {
    let (config_arg, leaves) = match args.split_first() {
        Some((first, rest)) => (first.as_str(), rest),
        None => ("-", &[][..]),
    };
    let config = match config_arg {
        "-" => TreeConfig::default(),
        path => TreeConfig::load(path)?,
    };

    let mut tree = config.build(Mimc7)?;
    for leaf in leaves {
        let index = tree.insert(from_decimal(leaf)?, None)?;
        tracing::info!(index, leaf = %leaf, "replayed leaf");
    }

    tree.to_snapshot(&config.name).to_json()
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("replay failed: {e}");
            std::process::exit(1);
        }
    }
}
