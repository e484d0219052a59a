use cube_mcts::{
    compress, estimate_distance, format_move, greedy_solve, parse_move, random_move, Estimator,
    PuzzleState, Rotation, SearchConfig, Searcher, SolverError,
};
use std::sync::Arc;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seq(text: &str) -> Vec<Rotation> {
    parse_move(text).unwrap()
}

#[test_log::test]
fn test_single_rotation_solved_by_inverse() {
    for explore_param in [0.01, 0.1, 0.5, 1.0] {
        let config = SearchConfig::builder()
            .iterations(18)
            .explore_param(explore_param)
            .seed(3)
            .build();
        let report = Searcher::new(config).unwrap().solve(&seq("R1")).unwrap();
        assert!(report.solved, "explore_param {explore_param}");
        assert_eq!("R3", format_move(&report.path));
    }
}

#[test_log::test]
fn test_two_rotation_scramble() {
    for seed in 0..5 {
        let config = SearchConfig::builder().iterations(1000).seed(seed).build();
        let scramble = seq("U1 R1");
        let report = Searcher::new(config).unwrap().solve(&scramble).unwrap();
        assert!(report.solved, "seed {seed}");
        let mut state = PuzzleState::scrambled(&scramble);
        state.apply_move(&report.path);
        assert!(state.is_solved());
    }
}

#[test_log::test]
fn test_two_rotation_scramble_with_workers() {
    let config = SearchConfig::builder()
        .iterations(1000)
        .seed(4)
        .workers(4)
        .build();
    let scramble = seq("U1 R1");
    let report = Searcher::new(config).unwrap().solve(&scramble).unwrap();
    assert!(report.solved);
    let mut state = PuzzleState::scrambled(&scramble);
    state.apply_move(&report.path);
    assert!(state.is_solved());
}

#[test_log::test]
fn test_workers_do_not_change_the_search() {
    let scramble = seq("F1 D3 L2");
    let inline = SearchConfig::builder().iterations(300).seed(21).build();
    let pooled = SearchConfig::builder()
        .iterations(300)
        .seed(21)
        .workers(3)
        .build();
    let a = Searcher::new(inline).unwrap().solve(&scramble).unwrap();
    let b = Searcher::new(pooled).unwrap().solve(&scramble).unwrap();
    assert_eq!(a, b);
}

#[test_log::test]
fn test_deep_rollout_solves() {
    let config = SearchConfig::builder()
        .iterations(1000)
        .rollout_depth(3)
        .seed(8)
        .build();
    let scramble = seq("U1 R1");
    let report = Searcher::new(config).unwrap().solve(&scramble).unwrap();
    assert!(report.solved);
    let mut state = PuzzleState::scrambled(&scramble);
    state.apply_move(&report.path);
    assert!(state.is_solved());
}

#[test_log::test]
fn test_greedy_lookahead_solves_short_scrambles() {
    let mut rng = StdRng::seed_from_u64(5);
    for text in ["R1", "D3", "U1 R1", "F2 L1"] {
        let scramble = seq(text);
        let state = PuzzleState::scrambled(&scramble);
        let played = greedy_solve(&state, 2, 4, &Estimator::Composite, &mut rng).unwrap();
        let mut end = state.clone();
        end.apply_move(&played);
        assert!(end.is_solved(), "{text}: {}", format_move(&played));
        assert_eq!(scramble.len(), played.len());
    }
}

#[test_log::test]
fn test_zero_distance_model_is_not_a_solve() {
    let model = Arc::new(|_: &PuzzleState| 0.0);
    for seed in 0..3 {
        let config = SearchConfig::builder().iterations(50).seed(seed).build();
        let scramble = seq("U1 R1 F1 L1");
        let report = Searcher::with_estimator(config, model.clone())
            .unwrap()
            .solve(&scramble)
            .unwrap();
        let mut state = PuzzleState::scrambled(&scramble);
        state.apply_move(&report.path);
        assert!(!report.solved || state.is_solved(), "seed {seed}");
    }
}

#[test]
fn test_solved_root() {
    let config = SearchConfig::builder().iterations(10).seed(0).build();
    let mut searcher = Searcher::new(config).unwrap();
    let mut tree = searcher.tree(PuzzleState::solved());
    assert!(searcher.search(&mut tree).unwrap());
    assert_eq!(0, tree.expansions());
    assert_eq!(1, tree.node_count());
}

#[test]
fn test_compress_scenarios() {
    assert!(compress(&seq("R1 R1 R1 R1")).is_empty());
    assert_eq!(seq("R2"), compress(&seq("R1 R1")));
}

#[test]
fn test_inverse_property_on_random_states() {
    let mut rng = StdRng::seed_from_u64(99);
    for depth in 0..12 {
        let state = PuzzleState::scrambled(&random_move(depth, &mut rng));
        for r in Rotation::all() {
            assert_eq!(state, state.apply_rotation(*r).apply_rotation(r.inverse()));
        }
        assert_eq!(state.is_solved(), estimate_distance(&state) == 0.0);
    }
}

#[test]
fn test_bad_token_is_reported() {
    let mut state = PuzzleState::solved();
    assert_eq!(
        Err(SolverError::InvalidRotation {
            token: "R5".to_string()
        }),
        state.apply_token("R5")
    );
    assert!(state.is_solved());
    assert!(state.moves().is_empty());
}
