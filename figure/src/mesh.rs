//! Wireframe outlines of the solid primitives, fitted in the unit cube
//! `[-0.5, 0.5]^3` with `z` pointing up.

use crate::model::SolidKind;
use std::f64::consts::TAU;

pub type Polyline = Vec<[f64; 3]>;

pub const DEFAULT_SEGMENTS: usize = 16;

pub fn solid_mesh(kind: SolidKind, segments: usize) -> Vec<Polyline> {
    let segments = segments.max(3);
    match kind {
        SolidKind::Box => box_edges(),
        SolidKind::Sphere => sphere(segments),
        SolidKind::Cylinder => cylinder(segments),
        SolidKind::Cone => cone(segments),
        SolidKind::Ring => ring(segments),
        SolidKind::Line => vec![vec![[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0]]],
    }
}

/// Places a unit polyline at `center`, scaled per axis.
pub fn place(line: &[[f64; 3]], center: [f64; 3], scale: [f64; 3]) -> Polyline {
    line.iter()
        .map(|p| {
            [
                center[0] + p[0] * scale[0],
                center[1] + p[1] * scale[1],
                center[2] + p[2] * scale[2],
            ]
        })
        .collect()
}

fn circle(radius: f64, z: f64, segments: usize) -> Polyline {
    (0..=segments)
        .map(|i| {
            let t = TAU * i as f64 / segments as f64;
            [radius * t.cos(), radius * t.sin(), z]
        })
        .collect()
}

fn box_edges() -> Vec<Polyline> {
    let h = 0.5;
    let square = |z: f64| vec![[-h, -h, z], [h, -h, z], [h, h, z], [-h, h, z], [-h, -h, z]];
    let mut lines = vec![square(-h), square(h)];
    for (x, y) in [(-h, -h), (h, -h), (h, h), (-h, h)] {
        lines.push(vec![[x, y, -h], [x, y, h]]);
    }
    lines
}

fn sphere(segments: usize) -> Vec<Polyline> {
    let rings = (segments / 2).max(2);
    let mut lines = Vec::with_capacity(rings + segments);
    for i in 1..rings {
        let phi = std::f64::consts::PI * i as f64 / rings as f64;
        lines.push(circle(0.5 * phi.sin(), 0.5 * phi.cos(), segments));
    }
    for j in 0..segments {
        let theta = TAU * j as f64 / segments as f64;
        let meridian = (0..=rings)
            .map(|i| {
                let phi = std::f64::consts::PI * i as f64 / rings as f64;
                [
                    0.5 * phi.sin() * theta.cos(),
                    0.5 * phi.sin() * theta.sin(),
                    0.5 * phi.cos(),
                ]
            })
            .collect();
        lines.push(meridian);
    }
    lines
}

fn cylinder(segments: usize) -> Vec<Polyline> {
    let mut lines = vec![circle(0.5, -0.5, segments), circle(0.5, 0.5, segments)];
    for j in 0..segments {
        let t = TAU * j as f64 / segments as f64;
        let (x, y) = (0.5 * t.cos(), 0.5 * t.sin());
        lines.push(vec![[x, y, -0.5], [x, y, 0.5]]);
    }
    lines
}

fn cone(segments: usize) -> Vec<Polyline> {
    let mut lines = vec![circle(0.5, -0.5, segments)];
    for j in 0..segments {
        let t = TAU * j as f64 / segments as f64;
        lines.push(vec![[0.5 * t.cos(), 0.5 * t.sin(), -0.5], [0.0, 0.0, 0.5]]);
    }
    lines
}

fn ring(segments: usize) -> Vec<Polyline> {
    const MAJOR: f64 = 0.35;
    const MINOR: f64 = 0.15;
    let tube = (segments / 2).max(3);
    let mut lines = Vec::with_capacity(tube + segments);
    for i in 0..tube {
        let phi = TAU * i as f64 / tube as f64;
        lines.push(circle(MAJOR + MINOR * phi.cos(), MINOR * phi.sin(), segments));
    }
    for j in 0..segments {
        let theta = TAU * j as f64 / segments as f64;
        let section = (0..=tube)
            .map(|i| {
                let phi = TAU * i as f64 / tube as f64;
                let r = MAJOR + MINOR * phi.cos();
                [r * theta.cos(), r * theta.sin(), MINOR * phi.sin()]
            })
            .collect();
        lines.push(section);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_points(kind: SolidKind) -> Vec<[f64; 3]> {
        solid_mesh(kind, DEFAULT_SEGMENTS).into_iter().flatten().collect()
    }

    #[test]
    fn primitives_fit_in_unit_cube() {
        for kind in [
            SolidKind::Box,
            SolidKind::Sphere,
            SolidKind::Cylinder,
            SolidKind::Cone,
            SolidKind::Ring,
            SolidKind::Line,
        ] {
            for p in all_points(kind) {
                assert!(p.iter().all(|c| c.abs() <= 0.5 + 1e-9), "{kind:?} {p:?}");
            }
        }
    }

    #[test]
    fn box_has_twelve_edges() {
        let edges: usize = solid_mesh(SolidKind::Box, 3)
            .iter()
            .map(|line| line.len() - 1)
            .sum();
        assert_eq!(edges, 12);
    }

    #[test]
    fn place_scales_then_translates() {
        let placed = place(&[[0.5, -0.5, 0.0]], [1.0, 2.0, 3.0], [2.0, 4.0, 1.0]);
        assert_eq!(placed, vec![[2.0, 0.0, 3.0]]);
    }
}
