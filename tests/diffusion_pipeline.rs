//! End-to-end tests over the public API: graph construction from cells,
//! distance-matrix properties, multi-source search, coordinate snapping,
//! and the diffusion model driving a small tree.

use geodrift::prelude::*;
use geodrift::tree::{collect_graph_locations, initialise_locations};
use geodrift::{
    parse_location_table, sampled_trait_log_likelihood, snap_tip_locations, GraphNode,
    StrictClock,
};

/// Uniform-weight graph from explicit adjacency.
fn graph_from_edges(n: usize, edges: &[(usize, usize)]) -> Graph {
    let mut nodes: Vec<GraphNode> = (0..n)
        .map(|id| {
            let lat = (id / 3) as f64 * 2.0;
            let lon = (id % 3) as f64 * 2.0;
            GraphNode::new(
                id,
                CellShape::Triangle([
                    GeoPoint::new(lat, lon),
                    GeoPoint::new(lat, lon + 1.0),
                    GeoPoint::new(lat + 1.0, lon),
                ]),
                0,
            )
        })
        .collect();
    for &(a, b) in edges {
        nodes[a].add_neighbour(b);
        nodes[b].add_neighbour(a);
    }
    Graph::from_nodes(
        nodes,
        GraphConfig {
            use_great_circle: false,
            ..GraphConfig::default()
        },
    )
}

/// 3x3 grid with 4-connectivity.
fn grid_graph() -> Graph {
    let mut edges = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let id = row * 3 + col;
            if col + 1 < 3 {
                edges.push((id, id + 1));
            }
            if row + 1 < 3 {
                edges.push((id, id + 3));
            }
        }
    }
    graph_from_edges(9, &edges)
}

/// A strip of triangles, each sharing an edge with the next, giving a
/// path-shaped region graph once adjacency is derived from the cells.
fn strip_cells(len: usize) -> Vec<(CellShape, i32)> {
    let mut cells = Vec::new();
    for i in 0..len {
        let k = (i / 2) as f64;
        let shape = if i % 2 == 0 {
            CellShape::Triangle([
                GeoPoint::new(0.0, k),
                GeoPoint::new(0.0, k + 1.0),
                GeoPoint::new(1.0, k),
            ])
        } else {
            CellShape::Triangle([
                GeoPoint::new(0.0, k + 1.0),
                GeoPoint::new(1.0, k),
                GeoPoint::new(1.0, k + 1.0),
            ])
        };
        cells.push((shape, 0));
    }
    cells
}

#[test]
fn test_distance_matrix_invariants_on_grid() {
    let graph = grid_graph();
    let matrix = graph.build_distance_matrix(4);
    let n = graph.len();
    for i in 0..n {
        assert_eq!(matrix.distance(i, i), 0.0);
        for j in 0..n {
            assert_eq!(matrix.distance(i, j), matrix.distance(j, i));
            for k in 0..n {
                assert!(
                    matrix.distance(i, k) <= matrix.distance(i, j) + matrix.distance(j, k) + 1e-12,
                    "triangle inequality violated at ({}, {}, {})",
                    i,
                    j,
                    k
                );
            }
        }
    }
    // Opposite corners of the grid are four hops apart.
    assert_eq!(matrix.distance(0, 8), 4.0);
}

#[test]
fn test_sorted_by_distance_is_monotone() {
    let graph = grid_graph();
    graph.build_distance_matrix(1);
    for source in 0..graph.len() {
        let order = graph.sorted_by_distance(source).expect("matrix built");
        assert_eq!(order[0], source);
        let row: Vec<f64> = order
            .iter()
            .map(|&id| graph.distance(source, id).unwrap())
            .collect();
        assert_eq!(row[0], 0.0);
        for pair in row.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}

#[test]
fn test_meet_in_middle_agrees_with_matrix() {
    let graph = grid_graph();
    graph.build_distance_matrix(1);
    for &(a, b) in &[(0, 8), (2, 6), (1, 7), (0, 5)] {
        let result = graph
            .meet_in_middle(a, 1.0, b, 1.0)
            .expect("grid is connected");
        let total = (result.path1.len() + result.path2.len() - 2) as f64;
        let expected = graph.distance(a, b).unwrap();
        assert_eq!(total, expected, "meet {}..{} via {}", a, b, result.meeting);
        assert_eq!(*result.path1.first().unwrap(), a);
        assert_eq!(*result.path2.first().unwrap(), b);
        assert_eq!(*result.path1.last().unwrap(), result.meeting);
        assert_eq!(*result.path2.last().unwrap(), result.meeting);
    }
}

#[test]
fn test_meet_in_middle_three_on_grid() {
    let graph = grid_graph();
    let result = graph
        .meet_in_middle_three(0, 1.0, 2, 1.0, 6, 1.0)
        .expect("grid is connected");
    for (i, &source) in [0usize, 2, 6].iter().enumerate() {
        assert_eq!(*result.paths[i].first().unwrap(), source);
        assert_eq!(*result.paths[i].last().unwrap(), result.meeting);
    }
}

#[test]
fn test_adjacency_from_shared_cell_edges() {
    let graph = Graph::from_cells(
        strip_cells(6),
        GraphConfig {
            use_great_circle: false,
            ..GraphConfig::default()
        },
    );
    // A strip is a path: the ends have one neighbor, the middle two.
    assert_eq!(graph.node(0).neighbours(), &[1]);
    assert_eq!(graph.node(5).neighbours(), &[4]);
    for id in 1..5 {
        assert_eq!(graph.node(id).neighbours(), &[id - 1, id + 1]);
    }
}

#[test]
fn test_coordinate_snapping_through_graph() {
    let graph = Graph::from_cells(
        strip_cells(6),
        GraphConfig {
            use_great_circle: false,
            ..GraphConfig::default()
        },
    );
    for id in 0..graph.len() {
        let c = *graph.node(id).center();
        assert_eq!(graph.node_at(c.lat, c.lon), Some(id));
    }
    // Far outside the inflated bounding box.
    assert_eq!(graph.node_at(50.0, 50.0), None);
    assert_eq!(graph.node_at(-50.0, -50.0), None);
}

#[test]
fn test_map_path_respects_endpoints_and_adjacency() {
    let graph = grid_graph();
    let model = DiffusionModel::new(graph, 1.0, 2);

    assert_eq!(model.calc_map_path(4, 4, 1.0), vec![4]);
    assert_eq!(model.calc_map_path(4, 5, 1.0), vec![4, 5]);

    let path = model.calc_map_path(0, 8, 2.0);
    assert_eq!(*path.first().unwrap(), 0);
    assert_eq!(*path.last().unwrap(), 8);
    // Every hop in the reconstruction is a graph edge.
    for pair in path.windows(2) {
        assert!(
            model.graph().node(pair[1]).is_neighbour(pair[0]) || pair[0] == pair[1],
            "{} -> {} is not an edge",
            pair[0],
            pair[1]
        );
    }
}

/// Deterministic random source for the tree fixtures.
struct FlipFlop(bool);

impl RandomSource for FlipFlop {
    fn next_usize(&mut self, bound: usize) -> usize {
        0 % bound.max(1)
    }

    fn next_bool(&mut self) -> bool {
        self.0 = !self.0;
        self.0
    }
}

/// Three-leaf tree: ((A,B),C) with unit branch spacing.
struct ThreeLeafTree;

impl TreeTopologyProvider for ThreeLeafTree {
    fn node_count(&self) -> usize {
        5
    }

    fn leaf_count(&self) -> usize {
        3
    }

    fn root(&self) -> usize {
        4
    }

    fn children(&self, node: usize) -> Option<(usize, usize)> {
        match node {
            3 => Some((0, 1)),
            4 => Some((3, 2)),
            _ => None,
        }
    }

    fn parent(&self, node: usize) -> Option<usize> {
        match node {
            0 | 1 => Some(3),
            2 | 3 => Some(4),
            _ => None,
        }
    }

    fn height(&self, node: usize) -> f64 {
        match node {
            3 => 1.0,
            4 => 2.0,
            _ => 0.0,
        }
    }
}

#[test]
fn test_full_workflow_from_location_table_to_likelihood() {
    let _ = env_logger::builder().is_test(true).try_init();
    let graph = Graph::from_cells(
        strip_cells(6),
        GraphConfig {
            use_great_circle: false,
            ..GraphConfig::default()
        },
    );

    // Taxon coordinates near the centers of cells 0, 2 and 5.
    let taxa: Vec<String> = ["west", "middle", "east"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let c0 = *graph.node(0).center();
    let c2 = *graph.node(2).center();
    let c5 = *graph.node(5).center();
    let table = format!(
        "West={} {}, middle={} {}, east={} {}",
        c0.lat, c0.lon, c2.lat, c2.lon, c5.lat, c5.lon
    );
    let positions = parse_location_table(&table, &taxa).expect("all tips located");
    let snapped = snap_tip_locations(&graph, &positions);
    assert_eq!(snapped, vec![Some(0), Some(2), Some(5)]);

    // Seed the tree's location state and resolve it to graph nodes.
    let tree = ThreeLeafTree;
    let mut locations: Vec<usize> = snapped.iter().map(|s| s.unwrap()).collect();
    locations.extend([0, 0]);
    initialise_locations(&tree, &mut locations, &mut FlipFlop(false));
    let resolved = collect_graph_locations(&tree, &locations).expect("valid location state");
    for &loc in &resolved {
        assert!(loc < graph.len());
    }
    assert_eq!(&resolved[..3], &[0, 2, 5]);

    let model = DiffusionModel::new(graph, 1.0, 1);
    let log_p = sampled_trait_log_likelihood(&model, &tree, &resolved, &StrictClock(1.0));
    assert!(log_p.is_finite());
    assert!(log_p < 0.0);
}

#[test]
fn test_missing_tip_location_is_fatal_and_aggregated() {
    let taxa: Vec<String> = ["west", "middle", "east"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let err = parse_location_table("middle=0.3 1.2", &taxa).unwrap_err();
    match err {
        GeodriftError::MissingLocations(names) => {
            assert_eq!(names, vec!["west".to_string(), "east".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
