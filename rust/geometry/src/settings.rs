// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion settings and shared tolerances

/// Tolerant point equality threshold, compared against squared distances.
pub const EPSILON: f64 = 1.4901161193847656e-8;

/// Gap threshold for wire repair and sewing, in model units.
pub const WIRE_JOIN_TOLERANCE: f64 = 0.001;

/// Half extent of the finite box standing in for an unbounded half space.
pub const HALF_SPACE_BOX_SIZE: f64 = 100.0;

/// Tunable parameters of a conversion run.
#[derive(Debug, Clone)]
pub struct GeometrySettings {
    /// Tolerant equality threshold for point comparisons
    pub epsilon: f64,
    /// Tessellation density of a full circle
    pub points_per_circle: usize,
    /// Minimum number of segments for any circular arc
    pub min_arc_segments: usize,
    /// Gap threshold for wire repair, squared distance compared against it
    pub wire_join_tolerance: f64,
    /// Vertex welding distance when sewing faces into shells
    pub sewing_tolerance: f64,
    /// Vertex welding factor for CSG operations, scaled by the length unit
    pub csg_fuzzy_factor: f64,
    /// Decimal places to round resolved coordinates to, off when `None`
    pub coordinate_decimals: Option<u32>,
    /// Resolve surface styles and attach appearances to items
    pub process_styles: bool,
    /// Resolve presentation layer assignments
    pub process_layers: bool,
    /// Capture text literal placements
    pub render_text: bool,
    /// Convert products on a worker pool instead of sequentially
    pub concurrent: bool,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        GeometrySettings {
            epsilon: EPSILON,
            points_per_circle: 40,
            min_arc_segments: 6,
            wire_join_tolerance: WIRE_JOIN_TOLERANCE,
            sewing_tolerance: WIRE_JOIN_TOLERANCE,
            csg_fuzzy_factor: 1.0e-7,
            coordinate_decimals: None,
            process_styles: true,
            process_layers: true,
            render_text: true,
            concurrent: false,
        }
    }
}

impl GeometrySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of segments for an arc spanning `angle` radians.
    pub fn arc_segments(&self, angle: f64) -> usize {
        let raw = (self.points_per_circle as f64 * angle.abs() / std::f64::consts::TAU) as usize;
        raw.max(self.min_arc_segments)
    }

    /// Segment count for a full circle of the configured density.
    pub fn circle_segments(&self) -> usize {
        self.points_per_circle.max(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_density() {
        let settings = GeometrySettings::default();
        assert_eq!(settings.points_per_circle, 40);
        assert_eq!(settings.arc_segments(std::f64::consts::TAU), 40);
        assert_eq!(settings.arc_segments(std::f64::consts::PI), 20);
    }

    #[test]
    fn test_small_arcs_clamp_to_minimum() {
        let settings = GeometrySettings::default();
        assert_eq!(settings.arc_segments(0.01), settings.min_arc_segments);
    }
}
