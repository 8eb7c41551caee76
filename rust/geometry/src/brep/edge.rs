// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analytic wire edges
//!
//! Edges keep their analytic definition (arc frames, angles) so trims,
//! reversal, and rigid transforms stay exact. Discretization happens only
//! when a consumer asks for sampled points.

use crate::settings::GeometrySettings;
use crate::{Matrix4, Point3};

/// Geometric carrier of an edge
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeGeometry {
    /// Straight segment between the stored endpoints
    Line,
    /// Circular arc in the XY plane of `frame`, traversed from
    /// `start_angle` over `span` radians (negative span = clockwise)
    Arc {
        frame: Matrix4<f64>,
        radius: f64,
        start_angle: f64,
        span: f64,
    },
    /// Elliptical arc in the XY plane of `frame`
    EllipticalArc {
        frame: Matrix4<f64>,
        semi_axis1: f64,
        semi_axis2: f64,
        start_angle: f64,
        span: f64,
    },
    /// Pre-sampled point run, endpoints included
    Polyline { points: Vec<Point3<f64>> },
}

/// One edge of a wire
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub geometry: EdgeGeometry,
}

impl Edge {
    /// Straight edge between two points
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        Edge {
            start,
            end,
            geometry: EdgeGeometry::Line,
        }
    }

    /// Circular arc, endpoints evaluated from the analytic definition
    pub fn arc(frame: Matrix4<f64>, radius: f64, start_angle: f64, span: f64) -> Self {
        let start = arc_point(&frame, radius, radius, start_angle);
        let end = arc_point(&frame, radius, radius, start_angle + span);
        Edge {
            start,
            end,
            geometry: EdgeGeometry::Arc {
                frame,
                radius,
                start_angle,
                span,
            },
        }
    }

    /// Elliptical arc, endpoints evaluated from the analytic definition
    pub fn elliptical_arc(
        frame: Matrix4<f64>,
        semi_axis1: f64,
        semi_axis2: f64,
        start_angle: f64,
        span: f64,
    ) -> Self {
        let start = arc_point(&frame, semi_axis1, semi_axis2, start_angle);
        let end = arc_point(&frame, semi_axis1, semi_axis2, start_angle + span);
        Edge {
            start,
            end,
            geometry: EdgeGeometry::EllipticalArc {
                frame,
                semi_axis1,
                semi_axis2,
                start_angle,
                span,
            },
        }
    }

    /// Polyline edge, `None` when fewer than two points remain
    pub fn polyline(points: Vec<Point3<f64>>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let start = points[0];
        let end = points[points.len() - 1];
        Some(Edge {
            start,
            end,
            geometry: EdgeGeometry::Polyline { points },
        })
    }

    /// True for edges that need more than their endpoints when sampled
    pub fn is_curved(&self) -> bool {
        match &self.geometry {
            EdgeGeometry::Line => false,
            EdgeGeometry::Polyline { points } => points.len() > 2,
            _ => true,
        }
    }

    /// Same carrier traversed in the opposite direction
    pub fn reversed(&self) -> Edge {
        let geometry = match &self.geometry {
            EdgeGeometry::Line => EdgeGeometry::Line,
            EdgeGeometry::Arc {
                frame,
                radius,
                start_angle,
                span,
            } => EdgeGeometry::Arc {
                frame: *frame,
                radius: *radius,
                start_angle: start_angle + span,
                span: -span,
            },
            EdgeGeometry::EllipticalArc {
                frame,
                semi_axis1,
                semi_axis2,
                start_angle,
                span,
            } => EdgeGeometry::EllipticalArc {
                frame: *frame,
                semi_axis1: *semi_axis1,
                semi_axis2: *semi_axis2,
                start_angle: start_angle + span,
                span: -span,
            },
            EdgeGeometry::Polyline { points } => {
                let mut reversed = points.clone();
                reversed.reverse();
                EdgeGeometry::Polyline { points: reversed }
            }
        };
        Edge {
            start: self.end,
            end: self.start,
            geometry,
        }
    }

    /// Sample the edge into points, endpoints included.
    ///
    /// Straight edges yield exactly their two endpoints; arcs are sampled
    /// uniformly in parameter space at the configured circle density.
    pub fn sample(&self, settings: &GeometrySettings) -> Vec<Point3<f64>> {
        match &self.geometry {
            EdgeGeometry::Line => vec![self.start, self.end],
            EdgeGeometry::Polyline { points } => points.clone(),
            EdgeGeometry::Arc {
                frame,
                radius,
                start_angle,
                span,
            } => sample_arc(frame, *radius, *radius, *start_angle, *span, settings, self),
            EdgeGeometry::EllipticalArc {
                frame,
                semi_axis1,
                semi_axis2,
                start_angle,
                span,
            } => sample_arc(
                frame,
                *semi_axis1,
                *semi_axis2,
                *start_angle,
                *span,
                settings,
                self,
            ),
        }
    }

    /// Replace analytic geometry with its sampled polyline.
    ///
    /// Needed before applying a non-uniform transform: a sheared arc is no
    /// longer described by a radius and angles.
    pub fn discretized(&self, settings: &GeometrySettings) -> Edge {
        if matches!(
            self.geometry,
            EdgeGeometry::Line | EdgeGeometry::Polyline { .. }
        ) {
            return self.clone();
        }
        let points = self.sample(settings);
        Edge {
            start: self.start,
            end: self.end,
            geometry: EdgeGeometry::Polyline { points },
        }
    }

    /// Apply a rigid or uniformly scaled transform in place
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.start = matrix.transform_point(&self.start);
        self.end = matrix.transform_point(&self.end);
        match &mut self.geometry {
            EdgeGeometry::Line => {}
            EdgeGeometry::Arc { frame, .. } | EdgeGeometry::EllipticalArc { frame, .. } => {
                *frame = matrix * *frame;
            }
            EdgeGeometry::Polyline { points } => {
                for p in points.iter_mut() {
                    *p = matrix.transform_point(p);
                }
            }
        }
    }
}

#[inline]
fn arc_point(frame: &Matrix4<f64>, semi_axis1: f64, semi_axis2: f64, angle: f64) -> Point3<f64> {
    frame.transform_point(&Point3::new(
        semi_axis1 * angle.cos(),
        semi_axis2 * angle.sin(),
        0.0,
    ))
}

fn sample_arc(
    frame: &Matrix4<f64>,
    semi_axis1: f64,
    semi_axis2: f64,
    start_angle: f64,
    span: f64,
    settings: &GeometrySettings,
    edge: &Edge,
) -> Vec<Point3<f64>> {
    let segments = settings.arc_segments(span);
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let angle = start_angle + span * (i as f64) / (segments as f64);
        points.push(arc_point(frame, semi_axis1, semi_axis2, angle));
    }
    // Keep stored endpoints authoritative, wire repair may have snapped them
    if let Some(first) = points.first_mut() {
        *first = edge.start;
    }
    if let Some(last) = points.last_mut() {
        *last = edge.end;
    }
    points
}
