use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use triangulum::delaunay::{max_coordinate, next_halfedge, triangle_of_edge};
use triangulum::{DelaunayError, Delaunator, EMPTY};

fn random_points(seed: u64, n: usize) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0)])
        .collect()
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn validate(points: &[[f64; 2]]) -> Delaunator<f64> {
    let d = Delaunator::from_points(points).unwrap();
    let n = points.len();

    assert_eq!(d.triangles.len(), d.halfedges.len());
    assert_eq!(d.triangles.len() % 3, 0);
    assert!(d.triangles.iter().all(|&i| i < n));

    // halfedges are symmetric and join edges with swapped endpoints
    for (e, &twin) in d.halfedges.iter().enumerate() {
        if twin == EMPTY {
            continue;
        }
        assert_eq!(d.halfedges[twin], e);
        assert_eq!(d.triangles[e], d.triangles[next_halfedge(twin)]);
        assert_eq!(d.triangles[twin], d.triangles[next_halfedge(e)]);
    }

    // every hull edge lacks a twin, and every twin-less edge is on the hull
    let hull_edges = d.halfedges.iter().filter(|&&t| t == EMPTY).count();
    assert_eq!(hull_edges, d.hull.len());

    // all points lie on or inside the hull
    let scale = 1e-9;
    let sign = (0..d.hull.len())
        .map(|k| {
            let (a, b) = (d.hull[k], d.hull[(k + 1) % d.hull.len()]);
            cross([0.0, 0.0], points[a], points[b])
        })
        .sum::<f64>()
        .signum();
    for k in 0..d.hull.len() {
        let (a, b) = (points[d.hull[k]], points[d.hull[(k + 1) % d.hull.len()]]);
        for &p in points {
            assert!(sign * cross(a, b, p) >= -scale);
        }
    }

    // Euler: a triangulation of n points with h on the hull has 2n - 2 - h triangles
    let mut used = vec![false; n];
    for &i in &d.triangles {
        used[i] = true;
    }
    let used = used.iter().filter(|&&u| u).count();
    assert_eq!(d.len(), 2 * used - 2 - d.hull.len());

    // no point lies strictly inside any circumcircle
    for t in 0..d.len() {
        let c = d.circumcenter(t);
        let [a, _, _] = d.points_of_triangle(t);
        let r2 = dist2(c, points[a]);
        if !r2.is_finite() {
            continue;
        }
        for p in points {
            assert!(dist2(c, *p) >= r2 * (1.0 - 1e-9));
        }
    }
    d
}

fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

#[test]
fn test_square() {
    let d = Delaunator::from_points(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]]).unwrap();
    assert_eq!(d.len(), 2);
    assert_eq!(d.triangles, vec![0, 2, 1, 0, 3, 2]);
    assert_eq!(d.hull, vec![0, 3, 2, 1]);

    let shared: Vec<usize> = (0..6).filter(|&e| d.halfedges[e] != EMPTY).collect();
    assert_eq!(shared.len(), 2);
    assert_eq!(d.halfedges[shared[0]], shared[1]);
    assert_eq!(d.triangles_adjacent_to_triangle(0).collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_flat_coords() {
    let d = Delaunator::new(&[0., 0., 1., 0., 1., 1., 0., 1.]).unwrap();
    assert_eq!(d.points(), &[[0., 0.], [1., 0.], [1., 1.], [0., 1.]]);
    assert_eq!(d.triangles, vec![0, 2, 1, 0, 3, 2]);
}

#[test]
fn test_collinear() {
    let err = Delaunator::from_points(&[[0., 0.], [1., 1.], [2., 2.]]).unwrap_err();
    assert_eq!(err, DelaunayError::Collinear);

    let err = Delaunator::from_points(&[[3., 3.]; 5]).unwrap_err();
    assert_eq!(err, DelaunayError::Collinear);
}

#[test]
fn test_invalid_input() {
    assert_eq!(
        Delaunator::<f64>::from_points(&[[0., 0.], [1., 0.]]).unwrap_err(),
        DelaunayError::NotEnoughPoints { found: 2 }
    );
    assert_eq!(
        Delaunator::from_points(&[[0., 0.], [1., 0.], [f64::NAN, 1.]]).unwrap_err(),
        DelaunayError::NonFiniteCoordinate { index: 2 }
    );
}

#[test]
fn test_coordinate_magnitude() {
    let square = |s: f64| [[0., 0.], [s, 0.], [0., s], [s, s]];
    assert_eq!(
        Delaunator::from_points(&square(1e160)).unwrap_err(),
        DelaunayError::CoordinateTooLarge { index: 1 }
    );
    assert_eq!(Delaunator::from_points(&square(1e70)).unwrap().len(), 2);

    let limit = max_coordinate::<f64>();
    assert!(limit > 1e76 && limit < 1e77);
    assert!(Delaunator::from_points(&square(limit)).is_ok());
}

#[test]
fn test_single_triangle() {
    let d = validate(&[[0., 0.], [4., 0.], [0., 3.]]);
    assert_eq!(d.len(), 1);
    assert_eq!(d.hull.len(), 3);
    assert!(d.halfedges.iter().all(|&e| e == EMPTY));
}

#[test]
fn test_duplicates_are_skipped() {
    let points = [[0., 0.], [1., 0.], [1., 1.], [0., 1.], [1., 1.], [0., 0.]];
    let d = Delaunator::from_points(&points).unwrap();
    assert_eq!(d.len(), 2);
    let inedges = d.inedges();
    assert_eq!(inedges.iter().filter(|&&e| e == EMPTY).count(), 2);
}

#[test]
fn test_random_points() {
    for (seed, n) in [(1, 10), (2, 100), (3, 1000)] {
        let d = validate(&random_points(seed, n));
        assert!(d.inedges().iter().all(|&e| e != EMPTY));
    }
}

#[test]
fn test_grid() {
    // many cocircular quadruples
    let points: Vec<[f64; 2]> = (0..100).map(|i| [(i % 10) as f64, (i / 10) as f64]).collect();
    let d = validate(&points);
    assert!(d.hull.len() >= 4);
}

#[test]
fn test_f32() {
    let d = Delaunator::<f32>::from_points(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.], [0.5, 0.4]]).unwrap();
    assert_eq!(d.len(), 4);
    assert_eq!(d.hull.len(), 4);
}

#[test]
fn test_edges_around_point() {
    let points = random_points(4, 50);
    let d = Delaunator::from_points(&points).unwrap();
    for (p, &start) in d.inedges().iter().enumerate() {
        for e in d.edges_around_point(start) {
            assert_eq!(d.triangles[next_halfedge(e)], p);
            assert!(d.points_of_triangle(triangle_of_edge(e)).contains(&p));
        }
    }
    assert_eq!(d.edges_around_point(EMPTY).count(), 0);
}

#[test]
fn test_voronoi_hexagon() {
    let mut points = vec![[0.0, 0.0]];
    for k in 0..6 {
        let a = std::f64::consts::FRAC_PI_3 * k as f64;
        points.push([a.cos(), a.sin()]);
    }
    for k in 0..6 {
        let a = std::f64::consts::FRAC_PI_6 + std::f64::consts::FRAC_PI_3 * k as f64;
        points.push([3.0 * a.cos(), 3.0 * a.sin()]);
    }
    let d = Delaunator::from_points(&points).unwrap();

    let cell = d.voronoi_cell(0).unwrap();
    assert_eq!(cell.point, 0);
    assert!(cell.bounded);
    assert_eq!(cell.vertices.len(), 6);
    for v in &cell.vertices {
        assert_abs_diff_eq!(v[0].hypot(v[1]), 1.0 / 3f64.sqrt(), epsilon = 1e-12);
    }
    let [x, y] = cell.centroid().unwrap();
    assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
    // regular hexagon with circumradius 1/sqrt(3)
    assert_abs_diff_eq!(cell.area(), 3f64.sqrt() / 2.0, epsilon = 1e-12);

    // the outer ring is the hull, so its cells are unbounded
    for cell in d.voronoi_cells().filter(|c| c.point > 6) {
        assert!(!cell.bounded);
    }
}

#[test]
fn test_voronoi_cells() {
    let points = random_points(5, 200);
    let d = Delaunator::from_points(&points).unwrap();

    let cells: Vec<_> = d.voronoi_cells().collect();
    assert_eq!(cells.len(), points.len());
    // the iterator recomputes from scratch
    assert_eq!(d.voronoi_cells().collect::<Vec<_>>(), cells);

    for cell in &cells {
        assert_eq!(d.voronoi_cell(cell.point).as_ref(), Some(cell));
        assert_eq!(cell.bounded, !d.hull.contains(&cell.point));
        if !cell.bounded {
            continue;
        }
        let [x, y] = cell.centroid().unwrap();
        let (min_x, max_x) = cell
            .vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v[0]), hi.max(v[0])));
        let (min_y, max_y) = cell
            .vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v[1]), hi.max(v[1])));
        assert!(x >= min_x && x <= max_x);
        assert!(y >= min_y && y <= max_y);
        assert!(cell.area() > 0.0);
    }

    // every triangle gives a vertex to the cell of each of its corners
    let incident: usize = cells.iter().map(|c| c.vertices.len()).sum();
    assert_eq!(incident, d.triangles.len());
}
