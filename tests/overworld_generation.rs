//! Integration tests for overworld graph generation and travel.

use deepwild::generation::utils::rng_from_seed;
use deepwild::{
    generate_overworld, DeepwildError, DeepwildResult, EnemyType, OverworldEdge,
    OverworldGraphGenerator, OverworldParams, Position,
};

#[test]
fn test_small_overworld_scenario() -> DeepwildResult<()> {
    let graph = generate_overworld(10, 8, 4.0, 0.1, 0.3, 7)?;

    assert!(graph.node_count() >= 2);
    assert!(graph.is_connected());
    let nodes: Vec<Position> = graph.nodes().collect();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(a.euclidean_distance(*b) >= 4.0, "{} and {} too close", a, b);
        }
    }
    Ok(())
}

#[test]
fn test_forced_disconnection_regenerates() -> DeepwildResult<()> {
    // Every edge is a prune candidate on the first attempt only.
    let policy = |_: &OverworldEdge, _: &OverworldParams, attempt: u32| {
        if attempt == 1 {
            -1.0
        } else {
            0.1 + 0.3 * 4.0
        }
    };
    let params = OverworldParams {
        grid_width: 10,
        grid_height: 8,
        min_degree: 0,
        ..OverworldParams::default()
    };
    let mut rng = rng_from_seed(7);
    let (graph, report) =
        OverworldGraphGenerator::with_policy(policy).generate_with_report(&params, &mut rng)?;

    assert!(report.attempts >= 2);
    assert!(graph.is_connected());
    Ok(())
}

#[test]
fn test_forced_disconnection_can_exhaust() {
    let policy = |_: &OverworldEdge, _: &OverworldParams, _: u32| -1.0;
    let params = OverworldParams {
        grid_width: 10,
        grid_height: 8,
        min_degree: 0,
        max_attempts: 5,
        ..OverworldParams::default()
    };
    let mut rng = rng_from_seed(3);
    let result = OverworldGraphGenerator::with_policy(policy).generate_graph(&params, &mut rng);
    assert!(matches!(
        result,
        Err(DeepwildError::GenerationExhausted { attempts: 5, .. })
    ));
}

#[test]
fn test_same_seed_same_graph() -> DeepwildResult<()> {
    let first = generate_overworld(20, 10, 4.0, 0.1, 0.3, 2024)?;
    let second = generate_overworld(20, 10, 4.0, 0.1, 0.3, 2024)?;
    assert_eq!(first, second);
    assert_eq!(first.export_json()?, second.export_json()?);
    Ok(())
}

#[test]
fn test_no_isolated_nodes() -> DeepwildResult<()> {
    for seed in 0..10 {
        let graph = generate_overworld(20, 10, 4.0, 0.1, 0.3, seed)?;
        if graph.node_count() > 1 {
            assert!(graph.nodes().all(|n| graph.degree(n) >= 1), "seed {}", seed);
        }
    }
    Ok(())
}

#[test]
fn test_edges_are_weighted_by_distance() -> DeepwildResult<()> {
    let graph = generate_overworld(20, 10, 4.0, 0.1, 0.3, 11)?;
    for edge in graph.edges() {
        assert!(edge.a < edge.b);
        assert!((edge.weight - edge.a.euclidean_distance(edge.b)).abs() < 1e-12);
        assert!(graph.are_adjacent(edge.a, edge.b));
    }
    Ok(())
}

#[test]
fn test_travel_state_machine() -> DeepwildResult<()> {
    let mut graph = generate_overworld(20, 10, 4.0, 0.1, 0.3, 5)?;
    let start = graph.current_node();
    let Some(next) = graph.neighbors(start).next() else {
        return Ok(());
    };

    assert!(matches!(
        graph.commit_travel(),
        Err(DeepwildError::InvalidTravel(_))
    ));

    graph.set_destination(next)?;
    assert_eq!(graph.destination(), Some(next));
    assert_eq!(graph.commit_travel()?, next);

    assert_eq!(graph.current_node(), next);
    assert_eq!(graph.destination(), None);
    let attrs = graph.node_attr(next).unwrap();
    assert!(attrs.visited && attrs.discovered);
    assert!(graph
        .neighbors(next)
        .all(|n| graph.node_attr(n).unwrap().discovered));
    assert!(graph.node_attr(start).unwrap().visited);
    Ok(())
}

#[test]
fn test_enemy_types_alternate() -> DeepwildResult<()> {
    let graph = generate_overworld(20, 10, 4.0, 0.1, 0.3, 9)?;
    let types: Vec<EnemyType> = graph
        .nodes()
        .map(|n| graph.node_attr(n).unwrap().enemy_type)
        .collect();
    for (index, enemy_type) in types.iter().enumerate() {
        assert_eq!(*enemy_type, EnemyType::for_index(index));
    }
    Ok(())
}

#[test]
fn test_unreachable_spacing_is_rejected() {
    assert!(matches!(
        generate_overworld(10, 8, 40.0, 0.1, 0.3, 1),
        Err(DeepwildError::InvalidParameters(_))
    ));
}
