//! Integration tests for cave generation.

use deepwild::utils::{floor_is_connected, reachable_floor};
use deepwild::{
    generate_cave, CaveGenerator, CaveParams, DeepwildResult, GenerationConfig, Generator,
    Position,
};

#[test]
fn test_default_cave_scenario() -> DeepwildResult<()> {
    let params = CaveParams::default();
    let grid = generate_cave(20, 20, &params, 42)?;

    assert!(!grid.regions().is_empty(), "At least one region should survive");
    assert!(grid.border_is_solid());
    assert!(floor_is_connected(&grid));
    Ok(())
}

#[test]
fn test_border_cells_are_walls() -> DeepwildResult<()> {
    let grid = generate_cave(32, 18, &CaveParams::default(), 5)?;
    for x in 0..grid.width as i32 {
        assert!(grid.is_wall(x, 0));
        assert!(grid.is_wall(x, grid.height as i32 - 1));
    }
    for y in 0..grid.height as i32 {
        assert!(grid.is_wall(0, y));
        assert!(grid.is_wall(grid.width as i32 - 1, y));
    }
    Ok(())
}

#[test]
fn test_every_floor_cell_is_reachable() -> DeepwildResult<()> {
    for seed in [1, 2, 3, 17, 99] {
        let grid = generate_cave(40, 25, &CaveParams::default(), seed)?;
        let Ok(start) = grid.first_floor() else {
            continue;
        };
        let reachable = reachable_floor(&grid, start);
        assert_eq!(reachable.len(), grid.floor_count(), "seed {}", seed);
        assert!(reachable.len() >= CaveParams::default().room_min_size);
    }
    Ok(())
}

#[test]
fn test_same_seed_same_cave() -> DeepwildResult<()> {
    let params = CaveParams::default();
    let first = generate_cave(30, 20, &params, 1234)?;
    let second = generate_cave(30, 20, &params, 1234)?;
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    Ok(())
}

#[test]
fn test_out_of_bounds_reads_as_wall() -> DeepwildResult<()> {
    let grid = generate_cave(12, 12, &CaveParams::default(), 8)?;
    assert!(grid.is_wall(-1, 4));
    assert!(grid.is_wall(4, 12));
    assert!(!grid.in_bounds(Position::new(12, 0)));
    Ok(())
}

#[test]
fn test_invalid_dimensions_are_rejected() {
    assert!(generate_cave(2, 20, &CaveParams::default(), 1).is_err());
    let params = CaveParams {
        room_min_size: 500,
        ..CaveParams::default()
    };
    assert!(generate_cave(10, 10, &params, 1).is_err());
}

#[test]
fn test_generator_trait_uses_config_dimensions() -> DeepwildResult<()> {
    let config = GenerationConfig::for_testing(64);
    let generator = CaveGenerator::new();
    let mut rng = deepwild::generation::utils::create_rng(&config);
    let grid = generator.generate(&config, &mut rng)?;

    assert_eq!((grid.width, grid.height), (config.map_width, config.map_height));
    if grid.floor_count() > 0 {
        generator.validate(&grid, &config)?;
    }
    Ok(())
}
