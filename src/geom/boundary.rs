//! Pick boundaries: the closed regions target picks are validated against
//!
//! Every boundary supports an exact `closest_point` in addition to
//! `contains`; area-weapon legality and AI aim heuristics both depend on the
//! closest point being exact.

use serde::{Deserialize, Serialize};

use crate::geom::vec2::{normalize_angle, Vec2};

/// Quadrant firing arcs relative to a ship's facing
///
/// Each arc spans 90 degrees: Fore is centered on the facing, Port is 90
/// degrees counter-clockwise, Starboard 90 degrees clockwise, Aft opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiringArc {
    Fore,
    Aft,
    Port,
    Starboard,
}

impl FiringArc {
    pub const ALL: [FiringArc; 4] = [
        FiringArc::Fore,
        FiringArc::Aft,
        FiringArc::Port,
        FiringArc::Starboard,
    ];

    /// Arc center as an offset from the ship facing (radians)
    pub fn center_offset(self) -> f32 {
        match self {
            FiringArc::Fore => 0.0,
            FiringArc::Port => std::f32::consts::FRAC_PI_2,
            FiringArc::Starboard => -std::f32::consts::FRAC_PI_2,
            FiringArc::Aft => std::f32::consts::PI,
        }
    }

    /// Half-width of every arc (45 degrees)
    pub fn half_width() -> f32 {
        std::f32::consts::FRAC_PI_4
    }
}

/// A closed region a pick response must fall inside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PickBoundary {
    /// Axis-aligned rectangle (deploy zones, the battle field itself)
    Rect { min: Vec2, max: Vec2 },
    /// Disc around a center (drive jumps, blast previews)
    Circle { center: Vec2, radius: f32 },
    /// Circular sector: turn-limited movement fan
    Wedge {
        origin: Vec2,
        heading: f32,
        half_angle: f32,
        radius: f32,
    },
    /// Points along a line segment (reference-line picks)
    Segment { a: Vec2, b: Vec2 },
    /// Weapons-fire shape: annular sectors for a set of firing arcs
    FiringArcs {
        origin: Vec2,
        facing: f32,
        hull_radius: f32,
        range: f32,
        arcs: Vec<FiringArc>,
    },
}

impl PickBoundary {
    pub fn contains(&self, p: Vec2) -> bool {
        match self {
            PickBoundary::Rect { min, max } => {
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            }
            PickBoundary::Circle { center, radius } => center.distance(&p) <= *radius,
            PickBoundary::Wedge {
                origin,
                heading,
                half_angle,
                radius,
            } => {
                let d = p - *origin;
                let r = d.length();
                if r > *radius {
                    return false;
                }
                if r < 1e-4 {
                    return true;
                }
                normalize_angle(d.heading() - heading).abs() <= *half_angle
            }
            PickBoundary::Segment { a, b } => closest_on_segment(*a, *b, p).distance(&p) <= 1e-3,
            PickBoundary::FiringArcs {
                origin,
                facing,
                hull_radius,
                range,
                arcs,
            } => {
                let d = p - *origin;
                let r = d.length();
                if r < *hull_radius || r > hull_radius + range {
                    return false;
                }
                arcs.iter().any(|arc| {
                    let offset = normalize_angle(d.heading() - facing - arc.center_offset());
                    offset.abs() <= FiringArc::half_width()
                })
            }
        }
    }

    /// Exact closest point of the region to `p` (identity when `p` is inside)
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        match self {
            PickBoundary::Rect { min, max } => Vec2::new(
                p.x.clamp(min.x, max.x),
                p.y.clamp(min.y, max.y),
            ),
            PickBoundary::Circle { center, radius } => {
                let d = p - *center;
                if d.length() <= *radius {
                    p
                } else {
                    *center + d.normalize() * *radius
                }
            }
            PickBoundary::Wedge {
                origin,
                heading,
                half_angle,
                radius,
            } => closest_in_sector(*origin, *heading, *half_angle, 0.0, *radius, p),
            PickBoundary::Segment { a, b } => closest_on_segment(*a, *b, p),
            PickBoundary::FiringArcs {
                origin,
                facing,
                hull_radius,
                range,
                arcs,
            } => {
                let mut best = *origin + Vec2::from_heading(*facing) * *hull_radius;
                let mut best_dist = f32::INFINITY;
                for arc in arcs {
                    let candidate = closest_in_sector(
                        *origin,
                        facing + arc.center_offset(),
                        FiringArc::half_width(),
                        *hull_radius,
                        hull_radius + range,
                        p,
                    );
                    let dist = candidate.distance(&p);
                    if dist < best_dist {
                        best_dist = dist;
                        best = candidate;
                    }
                }
                best
            }
        }
    }
}

/// Closest point on segment [a, b] to p
fn closest_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point inside an annular sector
///
/// Sector: center angle `heading`, half-width `half_angle`, radii in
/// `[inner, outer]`. `inner = 0` degenerates to a plain circular sector.
fn closest_in_sector(
    origin: Vec2,
    heading: f32,
    half_angle: f32,
    inner: f32,
    outer: f32,
    p: Vec2,
) -> Vec2 {
    let d = p - origin;
    let r = d.length();
    let offset = normalize_angle(d.heading() - heading);

    if offset.abs() <= half_angle {
        if r >= inner && r <= outer {
            return p;
        }
        // Angularly inside: clamp radius toward the point
        let dir = if r < 1e-4 {
            Vec2::from_heading(heading)
        } else {
            d.normalize()
        };
        return origin + dir * r.clamp(inner, outer);
    }

    // Angularly outside: nearest point lies on one of the radial edges
    let mut best = origin + Vec2::from_heading(heading) * inner.max(1e-6);
    let mut best_dist = f32::INFINITY;
    for edge in [heading - half_angle, heading + half_angle] {
        let dir = Vec2::from_heading(edge);
        let candidate = closest_on_segment(origin + dir * inner, origin + dir * outer, p);
        let dist = candidate.distance(&p);
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_rect_contains_and_clamp() {
        let rect = PickBoundary::Rect {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(10.0, 5.0),
        };
        assert!(rect.contains(Vec2::new(5.0, 2.0)));
        assert!(!rect.contains(Vec2::new(11.0, 2.0)));
        let c = rect.closest_point(Vec2::new(15.0, -3.0));
        assert_eq!(c, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_circle_closest_point_on_rim() {
        let circle = PickBoundary::Circle {
            center: Vec2::new(0.0, 0.0),
            radius: 5.0,
        };
        let c = circle.closest_point(Vec2::new(10.0, 0.0));
        assert!(approx(c.x, 5.0));
        assert!(approx(c.y, 0.0));
        // Inside points are their own closest point
        let inside = Vec2::new(1.0, 1.0);
        assert_eq!(circle.closest_point(inside), inside);
    }

    #[test]
    fn test_wedge_contains() {
        let wedge = PickBoundary::Wedge {
            origin: Vec2::ZERO,
            heading: 0.0,
            half_angle: FRAC_PI_4,
            radius: 10.0,
        };
        assert!(wedge.contains(Vec2::new(5.0, 0.0)));
        assert!(wedge.contains(Vec2::new(5.0, 4.9)));
        assert!(!wedge.contains(Vec2::new(0.0, 5.0))); // 90 degrees off
        assert!(!wedge.contains(Vec2::new(11.0, 0.0))); // out of range
    }

    #[test]
    fn test_wedge_closest_point_clamps_radius() {
        let wedge = PickBoundary::Wedge {
            origin: Vec2::ZERO,
            heading: 0.0,
            half_angle: FRAC_PI_4,
            radius: 10.0,
        };
        let c = wedge.closest_point(Vec2::new(20.0, 0.0));
        assert!(approx(c.x, 10.0));
        assert!(approx(c.y, 0.0));
    }

    #[test]
    fn test_wedge_closest_point_on_edge() {
        let wedge = PickBoundary::Wedge {
            origin: Vec2::ZERO,
            heading: 0.0,
            half_angle: FRAC_PI_4,
            radius: 10.0,
        };
        // Point 90 degrees off axis: closest point must lie on the upper edge
        let c = wedge.closest_point(Vec2::new(0.0, 6.0));
        let edge_heading = c.heading();
        assert!(approx(edge_heading, FRAC_PI_4));
        assert!(c.length() <= 10.0 + 1e-4);
    }

    #[test]
    fn test_segment_closest_point() {
        let segment = PickBoundary::Segment {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(10.0, 0.0),
        };
        let c = segment.closest_point(Vec2::new(4.0, 3.0));
        assert!(approx(c.x, 4.0));
        assert!(approx(c.y, 0.0));
        let past_end = segment.closest_point(Vec2::new(15.0, 2.0));
        assert!(approx(past_end.x, 10.0));
    }

    #[test]
    fn test_firing_arcs_fore_only() {
        let arcs = PickBoundary::FiringArcs {
            origin: Vec2::ZERO,
            facing: 0.0,
            hull_radius: 2.0,
            range: 10.0,
            arcs: vec![FiringArc::Fore],
        };
        assert!(arcs.contains(Vec2::new(6.0, 0.0)));
        assert!(!arcs.contains(Vec2::new(1.0, 0.0))); // inside hull radius
        assert!(!arcs.contains(Vec2::new(13.0, 0.0))); // beyond range
        assert!(!arcs.contains(Vec2::new(-6.0, 0.0))); // aft
    }

    #[test]
    fn test_firing_arcs_respect_facing() {
        let arcs = PickBoundary::FiringArcs {
            origin: Vec2::ZERO,
            facing: FRAC_PI_2,
            hull_radius: 1.0,
            range: 10.0,
            arcs: vec![FiringArc::Fore],
        };
        assert!(arcs.contains(Vec2::new(0.0, 5.0)));
        assert!(!arcs.contains(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_firing_arcs_aft_and_port() {
        let arcs = PickBoundary::FiringArcs {
            origin: Vec2::ZERO,
            facing: 0.0,
            hull_radius: 1.0,
            range: 10.0,
            arcs: vec![FiringArc::Aft, FiringArc::Port],
        };
        assert!(arcs.contains(Vec2::new(-5.0, 0.0))); // aft
        assert!(arcs.contains(Vec2::new(0.0, 5.0))); // port
        assert!(!arcs.contains(Vec2::new(0.0, -5.0))); // starboard not in set
    }

    #[test]
    fn test_firing_arcs_closest_point_is_in_region() {
        let arcs = PickBoundary::FiringArcs {
            origin: Vec2::ZERO,
            facing: 0.0,
            hull_radius: 2.0,
            range: 8.0,
            arcs: vec![FiringArc::Fore, FiringArc::Starboard],
        };
        for probe in [
            Vec2::new(20.0, 1.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(-4.0, 12.0),
            Vec2::new(0.0, -30.0),
        ] {
            let c = arcs.closest_point(probe);
            // The closest point must itself satisfy the contains predicate
            // (within floating-point slack)
            let r = c.length();
            assert!(r >= 2.0 - 1e-3 && r <= 10.0 + 1e-3, "r = {}", r);
        }
    }

    #[test]
    fn test_arc_center_offsets() {
        assert!(approx(FiringArc::Fore.center_offset(), 0.0));
        assert!(approx(FiringArc::Aft.center_offset().abs(), PI));
        assert!(approx(FiringArc::Port.center_offset(), FRAC_PI_2));
        assert!(approx(FiringArc::Starboard.center_offset(), -FRAC_PI_2));
    }
}
