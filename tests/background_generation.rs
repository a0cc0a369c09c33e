//! Integration tests for generating worlds off the async runtime.

use deepwild::generation::background::{generate_new_game, spawn_new_game};
use deepwild::{GameState, GenerationConfig};
use tokio_test::assert_ok;

#[tokio::test]
async fn test_generate_new_game_in_background() {
    let config = GenerationConfig::for_testing(90);
    let game = assert_ok!(generate_new_game(config.clone()).await);

    let direct = assert_ok!(GameState::new_game(&config));
    assert_eq!(game.overworld(), direct.overworld());
    assert_ok!(game.current_area());
}

#[tokio::test]
async fn test_parallel_worlds_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|seed| spawn_new_game(GenerationConfig::for_testing(seed)))
        .collect();

    for (seed, handle) in handles.into_iter().enumerate() {
        let game = assert_ok!(assert_ok!(handle.await));
        assert_eq!(game.config().seed, seed as u64);
    }
}

#[test]
fn test_block_on_background_generation() {
    let game = tokio_test::block_on(async {
        let runtime_handle = spawn_new_game(GenerationConfig::for_testing(5));
        runtime_handle.await
    });
    let game = assert_ok!(assert_ok!(game));
    assert!(game.visited_count() >= 1);
}
