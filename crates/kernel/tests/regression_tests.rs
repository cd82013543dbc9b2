//! Near-degenerate solids collected from real map content.
//!
//! Each case lists face planes as three points in map order. Planes are
//! sorted canonically before construction, as the brush layer does.

use brush_kernel::{BoundingBox, ErrorKind, KernelError, Plane, Point3d, Polyhedron, Tolerance, Vec3};

type Triple = [[f64; 3]; 3];

fn world() -> BoundingBox {
    BoundingBox::cube(8192.0)
}

fn planes(triples: &[Triple]) -> Vec<Plane> {
    let mut planes: Vec<Plane> = triples
        .iter()
        .map(|[a, b, c]| {
            Plane::from_points(
                &Point3d::new(a[0], a[1], a[2]),
                &Point3d::new(b[0], b[1], b[2]),
                &Point3d::new(c[0], c[1], c[2]),
                Tolerance::default().colinear,
            )
            .expect("non-collinear face points")
        })
        .collect();
    planes.sort_by(|a, b| a.canonical_cmp(b));
    planes
}

fn build(triples: &[Triple]) -> Result<Polyhedron, KernelError> {
    Polyhedron::from_planes(&world(), &planes(triples), &Tolerance::default())
}

fn assert_fully_specified(poly: &Polyhedron, plane_count: usize) {
    assert_eq!(poly.face_count(), plane_count);
    for i in 0..plane_count {
        assert!(poly.find_face_by_payload(i).is_some(), "plane {i} produced no face");
    }
    assert!(poly.verify(&Tolerance::default()).is_ok());
}

#[test]
fn construct_with_failing_faces() {
    let triples = [
        [[-192.0, 704.0, 128.0], [-156.0, 650.0, 128.0], [-156.0, 650.0, 160.0]],
        [[-202.0, 604.0, 160.0], [-164.0, 664.0, 128.0], [-216.0, 613.0, 128.0]],
        [[-156.0, 650.0, 128.0], [-202.0, 604.0, 128.0], [-202.0, 604.0, 160.0]],
        [[-192.0, 704.0, 160.0], [-256.0, 640.0, 160.0], [-256.0, 640.0, 128.0]],
        [[-256.0, 640.0, 160.0], [-202.0, 604.0, 160.0], [-202.0, 604.0, 128.0]],
        [[-217.0, 672.0, 160.0], [-161.0, 672.0, 160.0], [-161.0, 603.0, 160.0]],
        [[-161.0, 603.0, 128.0], [-161.0, 672.0, 128.0], [-217.0, 672.0, 128.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 7);
}

#[test]
fn construct_with_failing_faces_3() {
    let triples = [
        [[-32.0, -1088.0, 896.0], [-64.0, -1120.0, 896.0], [-64.0, -1120.0, 912.0]],
        [[-32.0, -832.0, 896.0], [-32.0, -1088.0, 896.0], [-32.0, -1088.0, 912.0]],
        [[-64.0, -848.0, 912.0], [-64.0, -1120.0, 912.0], [-64.0, -1120.0, 896.0]],
        [[-32.0, -896.0, 896.0], [-32.0, -912.0, 912.0], [-64.0, -912.0, 912.0]],
        [[-64.0, -1088.0, 912.0], [-64.0, -848.0, 912.0], [-32.0, -848.0, 912.0]],
        [[-64.0, -864.0, 896.0], [-32.0, -864.0, 896.0], [-32.0, -832.0, 896.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 6);
}

#[test]
fn construct_with_failing_faces_4() {
    let triples = [
        [[-1268.0, 272.0, 2524.0], [-1268.0, 272.0, 2536.0], [-1268.0, 288.0, 2540.0]],
        [[-1280.0, 265.0, 2534.0], [-1268.0, 272.0, 2524.0], [-1268.0, 288.0, 2528.0]],
        [[-1268.0, 288.0, 2528.0], [-1280.0, 288.0, 2540.0], [-1280.0, 265.0, 2534.0]],
        [[-1268.0, 288.0, 2540.0], [-1280.0, 288.0, 2540.0], [-1280.0, 288.0, 2536.0]],
        [[-1268.0, 265.0, 2534.0], [-1280.0, 265.0, 2534.0], [-1280.0, 288.0, 2540.0]],
        [[-1268.0, 265.0, 2534.0], [-1268.0, 272.0, 2524.0], [-1280.0, 265.0, 2534.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 6);
}

#[test]
fn construct_with_failing_faces_5() {
    let triples = [
        [[1296.0, 896.0, 944.0], [1296.0, 1008.0, 1056.0], [1280.0, 1008.0, 1008.0]],
        [[1296.0, 1008.0, 1168.0], [1296.0, 1008.0, 1056.0], [1296.0, 896.0, 944.0]],
        [[1280.0, 1008.0, 1008.0], [1280.0, 1008.0, 1168.0], [1280.0, 896.0, 1056.0]],
        [[1280.0, 1008.0, 1168.0], [1280.0, 1008.0, 1008.0], [1296.0, 1008.0, 1056.0]],
        [[1296.0, 1008.0, 1168.0], [1296.0, 896.0, 1056.0], [1280.0, 896.0, 1056.0]],
        [[1280.0, 896.0, 896.0], [1280.0, 896.0, 1056.0], [1296.0, 896.0, 1056.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 6);
}

#[test]
fn construct_with_failing_faces_6() {
    let triples = [
        [[-80.0, -80.0, -3840.0], [-80.0, -80.0, -3824.0], [-32.0, -32.0, -3808.0]],
        [[-96.0, -32.0, -3840.0], [-96.0, -32.0, -3824.0], [-80.0, -80.0, -3824.0]],
        [[-96.0, -32.0, -3824.0], [-32.0, -32.0, -3808.0], [-80.0, -80.0, -3824.0]],
        [[-32.0, -32.0, -3840.0], [-32.0, -32.0, -3808.0], [-96.0, -32.0, -3824.0]],
        [[-32.0, -32.0, -3840.0], [-96.0, -32.0, -3840.0], [-80.0, -80.0, -3840.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 5);
}

#[test]
fn construct_with_many_sides() {
    let triples = [
        [[624.0, 688.0, -456.0], [656.0, 760.0, -480.0], [624.0, 680.0, -480.0]],
        [[536.0, 792.0, -480.0], [536.0, 792.0, -432.0], [488.0, 720.0, -480.0]],
        [[568.0, 656.0, -464.0], [568.0, 648.0, -480.0], [520.0, 672.0, -456.0]],
        [[520.0, 672.0, -456.0], [520.0, 664.0, -480.0], [488.0, 720.0, -452.0]],
        [[560.0, 728.0, -440.0], [488.0, 720.0, -452.0], [536.0, 792.0, -432.0]],
        [[568.0, 656.0, -464.0], [520.0, 672.0, -456.0], [624.0, 688.0, -456.0]],
        [[560.0, 728.0, -440.0], [624.0, 688.0, -456.0], [520.0, 672.0, -456.0]],
        [[600.0, 840.0, -480.0], [536.0, 792.0, -480.0], [636.0, 812.0, -480.0]],
    ];
    let poly = build(&triples).unwrap();
    assert_fully_specified(&poly, 8);
}

#[test]
fn construct_after_rotation() {
    let triples = [
        [
            [-729.68857812925364, -128.0, 2061.2927432882448],
            [-910.70791411301013, 128.0, 2242.3120792720015],
            [-820.19824612113155, -128.0, 1970.7830752963655],
        ],
        [
            [-639.17891013737574, -640.0, 1970.7830752963669],
            [-729.68857812925364, -128.0, 2061.2927432882448],
            [-729.68857812925364, -640.0, 1880.2734073044885],
        ],
        [
            [-639.17891013737574, -1024.0, 1970.7830752963669],
            [-820.19824612113177, -640.0, 2151.8024112801227],
            [-639.17891013737574, -640.0, 1970.7830752963669],
        ],
        [
            [-639.17891013737574, -1024.0, 1970.7830752963669],
            [-639.17891013737574, -640.0, 1970.7830752963669],
            [-729.68857812925364, -1024.0, 1880.2734073044885],
        ],
        [
            [-1001.2175821048878, -128.0, 2151.8024112801222],
            [-910.70791411301013, -128.0, 2242.3120792720015],
            [-910.70791411300991, -640.0, 2061.2927432882443],
        ],
        [
            [-639.17891013737574, -1024.0, 1970.7830752963669],
            [-729.68857812925364, -1024.0, 1880.2734073044885],
            [-820.19824612113177, -640.0, 2151.8024112801227],
        ],
        [
            [-1001.2175821048878, -128.0, 2151.8024112801222],
            [-1001.2175821048878, 128.0, 2151.8024112801222],
            [-910.70791411301013, -128.0, 2242.3120792720015],
        ],
        [
            [-729.68857812925364, -1024.0, 1880.2734073044885],
            [-729.68857812925364, -640.0, 1880.2734073044885],
            [-910.70791411300991, -640.0, 2061.2927432882443],
        ],
    ];
    let poly = build(&triples).unwrap();
    assert!(poly.verify(&Tolerance::default()).is_ok());
    assert!(poly.volume() > 0.0);
}

#[test]
fn move_tetrahedron_vertex_onto_another_fails() {
    let positions = [
        Point3d::new(-64.0, -64.0, 0.0),
        Point3d::new(64.0, -64.0, 0.0),
        Point3d::new(0.0, 64.0, 0.0),
        Point3d::new(0.0, 0.0, 32.0),
    ];
    let tol = Tolerance::default();
    let tetra = Polyhedron::from_points(&world(), &positions, &tol).unwrap();
    assert_eq!(tetra.face_count(), 4);

    for from in &positions {
        for to in &positions {
            if from == to {
                continue;
            }
            let mut poly = tetra.clone();
            let vertex = poly.find_vertex(from, 1e-6).unwrap();
            assert!(poly.move_vertex(vertex, *to, &world(), &tol).is_err());
            assert_eq!(poly.vertex_positions(), tetra.vertex_positions());
        }
    }
}

#[test]
fn subtract_cuboid_leaves_three_slabs() {
    let tol = Tolerance::default();
    let minuend = Polyhedron::cuboid(&BoundingBox::new(
        Point3d::new(-32.0, -16.0, -32.0),
        Point3d::new(32.0, 16.0, 32.0),
    ))
    .unwrap();
    let subtrahend = Polyhedron::cuboid(&BoundingBox::new(
        Point3d::new(-16.0, -32.0, -64.0),
        Point3d::new(16.0, 32.0, 0.0),
    ))
    .unwrap();

    let fragments = brush_kernel::boolean::engine::subtract(&minuend, &subtrahend, &tol).unwrap();
    assert_eq!(fragments.len(), 3);

    let mut found: Vec<(Point3d, Point3d)> = fragments
        .iter()
        .map(|f| (f.bounds().min, f.bounds().max))
        .collect();
    found.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
    assert_eq!(
        found,
        vec![
            (Point3d::new(-32.0, -16.0, -32.0), Point3d::new(-16.0, 16.0, 32.0)),
            (Point3d::new(-16.0, -16.0, 0.0), Point3d::new(16.0, 16.0, 32.0)),
            (Point3d::new(16.0, -16.0, -32.0), Point3d::new(32.0, 16.0, 32.0)),
        ]
    );
    for fragment in &fragments {
        assert_eq!(fragment.face_count(), 6);
    }
}

#[test]
fn nearly_coincident_plane_merges_or_fails_cleanly() {
    // tetrahedron x, y, z >= 0, x + y + z <= 64, plus a plane almost equal
    // to its base, lifted by less than the snapping distance
    let tol = Tolerance::default();
    let mut planes = vec![
        Plane::new(-Vec3::x(), 0.0),
        Plane::new(-Vec3::y(), 0.0),
        Plane::new(-Vec3::z(), 0.0),
        Plane::new(Vec3::new(1.0, 1.0, 1.0).normalize(), 64.0 / 3f64.sqrt()),
    ];
    let tilted = Vec3::new(1e-5, 0.0, -1.0).normalize();
    planes.push(Plane::from_point_normal(&Point3d::new(0.0, 0.0, 0.0005), tilted));
    planes.sort_by(|a, b| a.canonical_cmp(b));

    match Polyhedron::from_planes(&world(), &planes, &tol) {
        Ok(poly) => {
            assert!(poly.verify(&tol).is_ok());
            let euler = poly.vertex_count() as i64 - poly.edge_count() as i64 + poly.face_count() as i64;
            assert_eq!(euler, 2);
            assert!(poly.face_count() <= 5);
            assert!(poly.thickness() >= tol.min_edge_length);
        }
        Err(error) => assert!(matches!(
            error.kind(),
            ErrorKind::DegenerateInput | ErrorKind::Topological
        )),
    }
}

#[test]
fn subtract_drops_sub_threshold_sliver() {
    let tol = Tolerance::default();
    let minuend = Polyhedron::cuboid(&BoundingBox::new(Point3d::origin(), Point3d::new(16.0, 16.0, 16.0))).unwrap();
    for (offset, expected) in [(0.005, 0), (0.009, 0), (0.02, 1)] {
        let subtrahend = Polyhedron::cuboid(&BoundingBox::new(
            Point3d::new(offset, -8.0, -8.0),
            Point3d::new(32.0, 32.0, 32.0),
        ))
        .unwrap();
        let fragments = brush_kernel::boolean::engine::subtract(&minuend, &subtrahend, &tol).unwrap();
        assert_eq!(fragments.len(), expected, "offset {offset}");
    }
}
