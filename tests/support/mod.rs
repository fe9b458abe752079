#![allow(dead_code)]

use meshtopo::math::{Point2, Point3};
use meshtopo::operations::creation::{Corner, MakePolygon};
use meshtopo::topology::PolygonId;
use meshtopo::GeomData;

/// Unit cube faces, corners counter-clockwise seen from outside.
pub const CUBE_FACES: [[[f64; 3]; 4]; 6] = [
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
];

/// Index of the top face in [`CUBE_FACES`].
pub const TOP: usize = 1;

/// How the top face is unwrapped relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopCut {
    None,
    Full,
    /// Only the corner at (1, 1, 1) is moved away.
    Corner,
}

/// Continuous unwrap shared by every face: injective on the cube's corners.
fn unwrap(p: [f64; 3]) -> Point2 {
    Point2::new(p[0] + 0.3 * p[2], p[1] + 0.7 * p[2])
}

/// Builds a cube with UV channel 0 and returns its polygons in face order.
pub fn cube(cut: TopCut) -> (GeomData, Vec<PolygonId>) {
    let mut geom = GeomData::new();
    let mut polygons = Vec::with_capacity(CUBE_FACES.len());
    for (face, corners) in CUBE_FACES.iter().enumerate() {
        let corners = corners
            .iter()
            .map(|&p| {
                let mut uv = unwrap(p);
                let moved = match cut {
                    TopCut::None => false,
                    TopCut::Full => face == TOP,
                    TopCut::Corner => face == TOP && p == [1.0, 1.0, 1.0],
                };
                if moved {
                    uv.x += 10.0;
                }
                Corner::new(Point3::new(p[0], p[1], p[2])).with_uv(uv)
            })
            .collect();
        polygons.push(MakePolygon::new(corners).execute(&mut geom).unwrap());
    }
    (geom, polygons)
}

/// Routes `tracing` output through the test harness. `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
