// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_brep_core::{Curve, Entity, EntityId, Model, Placement, TopologicalItem, TrimmingSelect};
use ifc_brep_geometry::curve::{convert_curve, convert_loop};
use ifc_brep_geometry::geom_utils::{sample_wire, sample_wire_pairs};
use ifc_brep_geometry::{CollectingReporter, GeometrySettings, ReporterHandle};
use smallvec::smallvec;
use std::f64::consts::PI;
use std::sync::Arc;

fn circle_at_origin(model: &mut Model, radius: f64) -> EntityId {
    let location = model.add_point_2d(0.0, 0.0);
    let position = model.insert(Entity::Placement(Placement::Axis2Placement2D {
        location,
        ref_direction: None,
    }));
    model.insert(Entity::Curve(Curve::Circle { position, radius }))
}

fn half_circle_wire(model: &mut Model, radius: f64, sense: bool) -> EntityId {
    let circle = circle_at_origin(model, radius);
    model.insert(Entity::Curve(Curve::TrimmedCurve {
        basis_curve: circle,
        trim1: smallvec![TrimmingSelect::Parameter(0.0)],
        trim2: smallvec![TrimmingSelect::Parameter(PI)],
        sense_agreement: sense,
    }))
}

#[test]
fn test_full_circle_becomes_one_closed_edge() {
    let mut model = Model::new();
    let circle = circle_at_origin(&mut model, 2.0);

    let settings = GeometrySettings::default();
    let wire = convert_curve(&model, circle, &settings, &ReporterHandle::null()).unwrap();

    assert_eq!(wire.edge_count(), 1);
    assert!(wire.is_closed(settings.wire_join_tolerance));

    // 40 segments at the default circle density, every interior sample
    // doubled into segment pairs, an even count so nothing is padded
    let pairs = sample_wire_pairs(&wire, &settings);
    assert_eq!(pairs.len(), 80);
    for p in &pairs {
        let r = (p.x * p.x + p.y * p.y).sqrt();
        assert!((r - 2.0).abs() < 1e-9, "sample left the circle: {p:?}");
    }
}

#[test]
fn test_trimmed_circle_covers_upper_half() {
    let mut model = Model::new();
    let trimmed = half_circle_wire(&mut model, 2.0, true);

    let settings = GeometrySettings::default();
    let wire = convert_curve(&model, trimmed, &settings, &ReporterHandle::null()).unwrap();

    // Counter-clockwise from (2, 0) to (-2, 0)
    assert!((wire.start().unwrap().x - 2.0).abs() < 1e-9);
    assert!((wire.end().unwrap().x + 2.0).abs() < 1e-9);

    let samples = sample_wire(&wire, &settings);
    assert!(samples.iter().all(|p| p.y > -1e-9));
    assert!(samples.iter().any(|p| p.y > 1.9));
}

#[test]
fn test_reversed_sense_selects_other_half() {
    let mut model = Model::new();
    let trimmed = half_circle_wire(&mut model, 2.0, false);

    let settings = GeometrySettings::default();
    let wire = convert_curve(&model, trimmed, &settings, &ReporterHandle::null()).unwrap();

    // Same bounds, traversed clockwise: the lower half
    assert!((wire.start().unwrap().x - 2.0).abs() < 1e-9);
    assert!((wire.end().unwrap().x + 2.0).abs() < 1e-9);

    let samples = sample_wire(&wire, &settings);
    assert!(samples.iter().all(|p| p.y < 1e-9));
    assert!(samples.iter().any(|p| p.y < -1.9));
}

#[test]
fn test_poly_loop_closes_without_repairs() {
    let mut model = Model::new();
    let polygon: Vec<EntityId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .iter()
        .map(|&(x, y)| model.add_point(x, y, 0.0))
        .collect();
    let loop_id = model.insert(Entity::Topology(TopologicalItem::PolyLoop { polygon }));

    let collector = Arc::new(CollectingReporter::new());
    let reporter = ReporterHandle::new(collector.clone());
    let settings = GeometrySettings::default();
    let wire = convert_loop(&model, loop_id, &settings, &reporter).unwrap();

    // Four corners auto-close into four edges, clean input leaves
    // nothing for the repair pass to report
    assert_eq!(wire.edge_count(), 4);
    assert!(wire.is_closed(settings.wire_join_tolerance));
    assert!(collector.messages().is_empty());

    let start = wire.start().unwrap();
    let end = wire.end().unwrap();
    assert!((start - end).norm() < 1e-12);
}
