// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface style resolution
//!
//! Styled items point at representation items and carry chains of style
//! assignments. This module flattens those chains into [`Appearance`]
//! records, shares them through [`StyleCache`], and builds the inverse
//! indexes the converter needs to find styles and layers per item.

use std::sync::{Arc, Mutex};

use ifc_brep_core::{Entity, EntityId, Model};
use rustc_hash::FxHashMap;

use crate::diagnostics::ReporterHandle;
use crate::error::{Error, Result};

const COMPONENT: &str = "style resolver";

/// Resolved display appearance of one surface style
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    /// Diffuse colour as rgba, alpha already derived from transparency
    pub color: [f32; 4],
    /// 0 is opaque, 1 is fully transparent
    pub transparency: f32,
    /// Surface style entity the appearance was resolved from
    pub entity: EntityId,
}

/// Session-scoped cache of resolved appearances, keyed by the surface
/// style tag. Same locking discipline as the profile cache: lookups take
/// the lock briefly and a racing double-resolve is harmless.
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: Mutex<FxHashMap<EntityId, Arc<Appearance>>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the appearance behind a surface style, resolving on a miss
    pub fn get(
        &self,
        model: &Model,
        id: EntityId,
        reporter: &ReporterHandle,
    ) -> Result<Arc<Appearance>> {
        if !id.is_valid() {
            return Err(Error::data_integrity(
                id,
                "style entity has a negative identity tag",
            ));
        }

        if let Ok(entries) = self.entries.lock() {
            if let Some(appearance) = entries.get(&id) {
                return Ok(Arc::clone(appearance));
            }
        }

        let appearance = Arc::new(resolve_surface_style(model, id, reporter)?);

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, Arc::clone(&appearance));
        }

        Ok(appearance)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve every appearance a styled item carries.
///
/// Style assignments are flattened, repeated styles are kept once, and
/// styles that fail to resolve are skipped. Cosmetic data never fails a
/// conversion, so the skips are reported as info.
pub fn resolve_styled_item(
    model: &Model,
    id: EntityId,
    cache: &StyleCache,
    reporter: &ReporterHandle,
) -> Result<Vec<Arc<Appearance>>> {
    let styled = model.styled_item(id)?;
    let mut appearances = Vec::new();

    for &style in &styled.styles {
        match model.entity(style) {
            Ok(Entity::StyleAssignment(assignment)) => {
                for &inner in &assignment.styles {
                    collect_surface_style(model, inner, cache, &mut appearances, reporter);
                }
            }
            Ok(_) => collect_surface_style(model, style, cache, &mut appearances, reporter),
            Err(error) => reporter.info(
                format!("Skipping style that failed to resolve: {error}"),
                Some(style),
                COMPONENT,
            ),
        }
    }

    Ok(appearances)
}

/// Resolve a surface style into a flat appearance.
///
/// The first shading entry wins; a style without any shading gets a
/// neutral grey so the item still renders distinguishably.
pub fn resolve_surface_style(
    model: &Model,
    id: EntityId,
    reporter: &ReporterHandle,
) -> Result<Appearance> {
    let style = model.surface_style(id)?;

    for &entry in &style.styles {
        let Ok(shading) = model.surface_style_shading(entry) else {
            continue;
        };
        let colour = model.colour(shading.colour)?;
        let transparency = shading.transparency.unwrap_or(0.0).clamp(0.0, 1.0);
        return Ok(Appearance {
            color: [
                colour.red.clamp(0.0, 1.0) as f32,
                colour.green.clamp(0.0, 1.0) as f32,
                colour.blue.clamp(0.0, 1.0) as f32,
                (1.0 - transparency) as f32,
            ],
            transparency: transparency as f32,
            entity: id,
        });
    }

    reporter.info(
        "Surface style carries no shading, using a neutral grey",
        Some(id),
        COMPONENT,
    );
    Ok(Appearance {
        color: [0.8, 0.8, 0.8, 1.0],
        transparency: 0.0,
        entity: id,
    })
}

fn collect_surface_style(
    model: &Model,
    id: EntityId,
    cache: &StyleCache,
    out: &mut Vec<Arc<Appearance>>,
    reporter: &ReporterHandle,
) {
    if out.iter().any(|appearance| appearance.entity == id) {
        return;
    }
    match cache.get(model, id, reporter) {
        Ok(appearance) => out.push(appearance),
        Err(error) => reporter.info(
            format!("Skipping style that failed to resolve: {error}"),
            Some(id),
            COMPONENT,
        ),
    }
}

/// Inverse index from representation items to the styled items that
/// target them. Entity iteration is unordered, so the per-item lists are
/// sorted to keep appearance resolution deterministic.
#[derive(Debug, Default)]
pub struct StyledItemIndex {
    by_item: FxHashMap<EntityId, Vec<EntityId>>,
}

impl StyledItemIndex {
    pub fn build(model: &Model) -> Self {
        let mut by_item: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        for (id, entity) in model.iter() {
            if let Entity::StyledItem(styled) = entity {
                if let Some(item) = styled.item {
                    by_item.entry(item).or_default().push(id);
                }
            }
        }
        for list in by_item.values_mut() {
            list.sort_unstable();
        }
        Self { by_item }
    }

    /// Styled items targeting the given representation item
    pub fn styles_for(&self, item: EntityId) -> &[EntityId] {
        self.by_item
            .get(&item)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

/// Inverse index from representation items to presentation layer names
#[derive(Debug, Default)]
pub struct LayerIndex {
    by_item: FxHashMap<EntityId, Vec<String>>,
}

impl LayerIndex {
    pub fn build(model: &Model) -> Self {
        let mut by_item: FxHashMap<EntityId, Vec<String>> = FxHashMap::default();
        for (_, entity) in model.iter() {
            if let Entity::LayerAssignment(assignment) = entity {
                for &item in &assignment.assigned_items {
                    by_item.entry(item).or_default().push(assignment.name.clone());
                }
            }
        }
        for list in by_item.values_mut() {
            list.sort_unstable();
        }
        Self { by_item }
    }

    /// Layer names the given representation item is assigned to
    pub fn layers_for(&self, item: EntityId) -> &[String] {
        self.by_item
            .get(&item)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingReporter, Severity};
    use ifc_brep_core::{
        ColourRgb, PresentationLayerAssignment, PresentationStyleAssignment, StyledItem,
        SurfaceSide, SurfaceStyle, SurfaceStyleShading,
    };

    fn shaded_surface_style(
        model: &mut Model,
        rgb: (f64, f64, f64),
        transparency: Option<f64>,
    ) -> EntityId {
        let colour = model.insert(Entity::Colour(ColourRgb {
            name: None,
            red: rgb.0,
            green: rgb.1,
            blue: rgb.2,
        }));
        let shading = model.insert(Entity::SurfaceStyleShading(SurfaceStyleShading {
            colour,
            transparency,
        }));
        model.insert(Entity::SurfaceStyle(SurfaceStyle {
            name: None,
            side: SurfaceSide::Both,
            styles: vec![shading],
        }))
    }

    fn styled_item_over(model: &mut Model, item: Option<EntityId>, styles: Vec<EntityId>) -> EntityId {
        let assignment =
            model.insert(Entity::StyleAssignment(PresentationStyleAssignment { styles }));
        model.insert(Entity::StyledItem(StyledItem {
            item,
            styles: vec![assignment],
            name: None,
        }))
    }

    #[test]
    fn test_shading_resolves_color_and_alpha() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (0.5, 0.25, 1.0), Some(0.25));

        let appearance =
            resolve_surface_style(&model, style, &ReporterHandle::null()).unwrap();
        assert_eq!(appearance.color, [0.5, 0.25, 1.0, 0.75]);
        assert!((appearance.transparency - 0.25).abs() < 1e-6);
        assert_eq!(appearance.entity, style);
    }

    #[test]
    fn test_transparency_is_clamped() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (1.0, 0.0, 0.0), Some(1.5));

        let appearance =
            resolve_surface_style(&model, style, &ReporterHandle::null()).unwrap();
        assert_eq!(appearance.transparency, 1.0);
        assert_eq!(appearance.color[3], 0.0);
    }

    #[test]
    fn test_styled_item_through_assignment() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (0.1, 0.2, 0.3), None);
        let styled = styled_item_over(&mut model, None, vec![style]);

        let cache = StyleCache::new();
        let appearances =
            resolve_styled_item(&model, styled, &cache, &ReporterHandle::null()).unwrap();
        assert_eq!(appearances.len(), 1);
        assert_eq!(appearances[0].color[2], 0.3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_direct_surface_style_reference() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (0.0, 1.0, 0.0), None);
        let styled = model.insert(Entity::StyledItem(StyledItem {
            item: None,
            styles: vec![style],
            name: None,
        }));

        let appearances = resolve_styled_item(
            &model,
            styled,
            &StyleCache::new(),
            &ReporterHandle::null(),
        )
        .unwrap();
        assert_eq!(appearances.len(), 1);
    }

    #[test]
    fn test_duplicate_styles_resolve_once() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (0.4, 0.4, 0.4), None);
        let styled = styled_item_over(&mut model, None, vec![style, style]);

        let appearances = resolve_styled_item(
            &model,
            styled,
            &StyleCache::new(),
            &ReporterHandle::null(),
        )
        .unwrap();
        assert_eq!(appearances.len(), 1);
    }

    #[test]
    fn test_cache_returns_shared_arc() {
        let mut model = Model::new();
        let style = shaded_surface_style(&mut model, (0.9, 0.9, 0.9), None);

        let cache = StyleCache::new();
        let reporter = ReporterHandle::null();
        let first = cache.get(&model, style, &reporter).unwrap();
        let second = cache.get(&model, style, &reporter).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_negative_style_tag_errors() {
        let mut model = Model::new();
        let colour = model.insert(Entity::Colour(ColourRgb {
            name: None,
            red: 1.0,
            green: 1.0,
            blue: 1.0,
        }));
        let shading = model.insert(Entity::SurfaceStyleShading(SurfaceStyleShading {
            colour,
            transparency: None,
        }));
        model.insert_with_tag(
            -9,
            Entity::SurfaceStyle(SurfaceStyle {
                name: None,
                side: SurfaceSide::Both,
                styles: vec![shading],
            }),
        );

        let error = StyleCache::new()
            .get(&model, EntityId(-9), &ReporterHandle::null())
            .unwrap_err();
        assert!(matches!(error, Error::DataIntegrity { .. }));
    }

    #[test]
    fn test_style_without_shading_defaults_grey() {
        let mut model = Model::new();
        let style = model.insert(Entity::SurfaceStyle(SurfaceStyle {
            name: None,
            side: SurfaceSide::Positive,
            styles: Vec::new(),
        }));

        let collector = Arc::new(CollectingReporter::new());
        let reporter = ReporterHandle::new(collector.clone());
        let appearance = resolve_surface_style(&model, style, &reporter).unwrap();
        assert_eq!(appearance.color, [0.8, 0.8, 0.8, 1.0]);
        assert!(collector.has_severity(Severity::Info));
    }

    #[test]
    fn test_styled_item_index_is_sorted() {
        let mut model = Model::new();
        let target = model.add_point(0.0, 0.0, 0.0);
        let style = shaded_surface_style(&mut model, (0.2, 0.2, 0.2), None);
        let second = styled_item_over(&mut model, Some(target), vec![style]);
        let first = styled_item_over(&mut model, Some(target), vec![style]);

        let index = StyledItemIndex::build(&model);
        let found = index.styles_for(target);
        assert_eq!(found.len(), 2);
        assert!(found[0] < found[1]);
        assert!(found.contains(&first) && found.contains(&second));
        assert!(index.styles_for(EntityId(99_999)).is_empty());
    }

    #[test]
    fn test_layer_index_collects_names() {
        let mut model = Model::new();
        let item = model.add_point(0.0, 0.0, 0.0);
        model.insert(Entity::LayerAssignment(PresentationLayerAssignment {
            name: "Walls".to_string(),
            assigned_items: vec![item],
        }));
        model.insert(Entity::LayerAssignment(PresentationLayerAssignment {
            name: "Structure".to_string(),
            assigned_items: vec![item],
        }));

        let index = LayerIndex::build(&model);
        assert_eq!(index.layers_for(item), &["Structure", "Walls"]);
    }
}
