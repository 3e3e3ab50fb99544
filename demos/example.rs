use std::fs;

use triangulum::{deviation, flatten, Delaunator, Earcut};

fn load_fixture(name: &str, num_triangles: usize, expected_deviation: f64) -> Vec<f64> {
    // load JSON
    type Coords = Vec<Vec<[f64; 2]>>;
    let s = fs::read_to_string("./tests/fixtures/".to_string() + name + ".json").unwrap();
    let rings = serde_json::from_str::<Coords>(&s).unwrap();
    let (data, hole_indices) = flatten(&rings);

    // earcut
    let mut triangles: Vec<usize> = vec![];
    let mut earcut = Earcut::new();
    for _ in 0..500 {
        earcut.earcut(&data, &hole_indices, 2, &mut triangles);
    }

    // check
    assert!(triangles.len() == num_triangles * 3);
    if !triangles.is_empty() {
        assert!(deviation(&data, &hole_indices, 2, &triangles) <= expected_deviation);
    }
    data
}

fn main() {
    let data = load_fixture("gear-holes", 134, 1e-10);

    // the same vertices as a point set
    let d = Delaunator::new(&data).unwrap();
    let bounded = d.voronoi_cells().filter(|c| c.bounded).count();
    println!(
        "{} delaunay triangles, {} hull points, {} bounded voronoi cells",
        d.len(),
        d.hull.len(),
        bounded
    );
}
