use std::fs;

use triangulum::{deviation, flatten, Earcut};

fn load_fixture(name: &str) -> (Vec<f64>, Vec<usize>) {
    // load JSON
    type Coords = Vec<Vec<[f64; 2]>>;
    let s = fs::read_to_string("./tests/fixtures/".to_string() + name + ".json").unwrap();
    let rings = serde_json::from_str::<Coords>(&s).unwrap();
    flatten(&rings)
}

fn test_fixture(name: &str, num_triangles: usize, expected_deviation: f64) {
    let (data, hole_indices) = load_fixture(name);

    // earcut
    let mut triangles = vec![];
    let mut earcut = Earcut::new();
    earcut.earcut(&data, &hole_indices, 2, &mut triangles);

    // check
    assert_eq!(triangles.len(), num_triangles * 3);
    let num_vertices = data.len() / 2;
    assert!(triangles.iter().all(|&i| i < num_vertices));
    if !triangles.is_empty() {
        assert!(deviation(&data, &hole_indices, 2, &triangles) <= expected_deviation);
    }

    // a reused instance yields the same result
    let mut again = vec![];
    earcut.earcut(&data, &hole_indices, 2, &mut again);
    assert_eq!(again, triangles);
}

#[test]
fn fixture_star() {
    test_fixture("star", 8, 1e-14);
}

#[test]
fn fixture_square_hole() {
    test_fixture("square-hole", 8, 0.0);
}

#[test]
fn fixture_gear_holes() {
    // more than 80 vertices, so ear search goes through the z-order index
    test_fixture("gear-holes", 134, 1e-10);
}

#[test]
fn fixture_collinear() {
    test_fixture("collinear", 0, 0.0);
}

#[test]
fn fixture_gear_holes_3d() {
    // the same polygon lifted onto the plane z = x
    let (data, hole_indices) = load_fixture("gear-holes");
    let data3d: Vec<f64> = data.chunks_exact(2).flat_map(|v| [v[0], v[1], v[0]]).collect();

    let mut triangles: Vec<usize> = vec![];
    let mut earcut = Earcut::new();
    assert!(earcut.earcut3d(&data3d, &hole_indices, 3, &mut triangles));
    assert_eq!(triangles.len(), 134 * 3);
}
