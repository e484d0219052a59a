#![warn(clippy::all, clippy::pedantic)]
// Run with `cargo clippy --all -- -D warnings`.
#![deny(missing_docs)]
//! Scrambles a handful of cubes and solves them in parallel.

use cube_mcts::{compress, format_move, random_move, solve_batch, SearchConfig};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(2025);
    let scrambles: Vec<_> = [1, 2, 3, 4, 5]
        .into_iter()
        .map(|depth| compress(&random_move(depth, &mut rng)))
        .collect();

    let config = SearchConfig::builder()
        .iterations(10_000)
        .explore_param(0.1)
        .seed(7)
        .build();
    info!("solving {} scrambles", scrambles.len());

    match solve_batch(&scrambles, &config) {
        Ok(reports) => {
            for (scramble, report) in scrambles.iter().zip(reports) {
                println!(
                    "[{}] :: solved {} via [{}] in {} expansions, {} nodes, depth {}, best reward {:.3}",
                    format_move(scramble),
                    report.solved,
                    format_move(&compress(&report.path)),
                    report.expansions,
                    report.node_count,
                    report.max_depth,
                    report.best_reward,
                );
            }
        }
        Err(e) => {
            eprintln!("search failed: {e}");
            std::process::exit(1);
        }
    }
}
