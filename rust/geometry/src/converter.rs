// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model conversion driver
//!
//! [`GeometryConverter`] walks every product of a model, converts each
//! one fully (representations, placement, opening subtraction) and
//! collects the results keyed by product tag. Products are independent,
//! so the walk optionally runs on the rayon pool; workers only share the
//! insert-locked caches and merge finished products under one lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ifc_brep_core::{Entity, EntityId, Model};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::diagnostics::ReporterHandle;
use crate::error::Result;
use crate::profiles::ProfileCache;
use crate::representation::{MapCache, RepresentationConverter};
use crate::settings::GeometrySettings;
use crate::shape_data::{ConversionResult, ProductShapeData};
use crate::styles::{LayerIndex, StyleCache, StyledItemIndex};

const COMPONENT: &str = "geometry converter";

/// Converts a whole model into per-product shape data.
///
/// The converter owns the session caches, so converting several times
/// against the same model reuses resolved profiles, appearances and
/// representation maps.
pub struct GeometryConverter<'a> {
    model: &'a Model,
    settings: GeometrySettings,
    reporter: ReporterHandle,
    profile_cache: ProfileCache,
    style_cache: StyleCache,
    representation_map_cache: MapCache,
}

impl<'a> GeometryConverter<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self::with_settings(model, GeometrySettings::default())
    }

    pub fn with_settings(model: &'a Model, settings: GeometrySettings) -> Self {
        GeometryConverter {
            model,
            settings,
            reporter: ReporterHandle::null(),
            profile_cache: ProfileCache::new(),
            style_cache: StyleCache::new(),
            representation_map_cache: MapCache::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: ReporterHandle) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &GeometrySettings {
        &self.settings
    }

    pub fn profile_cache(&self) -> &ProfileCache {
        &self.profile_cache
    }

    pub fn style_cache(&self) -> &StyleCache {
        &self.style_cache
    }

    pub fn map_cache(&self) -> &MapCache {
        &self.representation_map_cache
    }

    /// Convert every non-opening product of the model.
    ///
    /// A product that fails outright is reported and skipped; only
    /// out-of-memory aborts the run.
    pub fn convert_model(&self) -> Result<ConversionResult> {
        let styled_items = StyledItemIndex::build(self.model);
        let layers = LayerIndex::build(self.model);
        let openings = opening_index(self.model);

        let converter = RepresentationConverter {
            model: self.model,
            settings: &self.settings,
            reporter: &self.reporter,
            profiles: &self.profile_cache,
            styles: &self.style_cache,
            styled_items: &styled_items,
            layers: &layers,
            maps: &self.representation_map_cache,
        };

        let all_products = self.model.products();

        // Openings convert inside their hosts, never as top-level shapes
        let mut opening_products: FxHashSet<EntityId> = FxHashSet::default();
        for ids in openings.values() {
            opening_products.extend(ids.iter().copied());
        }
        for &id in &all_products {
            if let Ok(product) = self.model.product(id) {
                opening_products.extend(product.openings.iter().copied());
            }
        }

        let products: Vec<EntityId> = all_products
            .into_iter()
            .filter(|id| !opening_products.contains(id))
            .collect();

        let total = products.len();
        self.reporter
            .progress_text(format!("Converting {total} products"), COMPONENT);
        if total == 0 {
            return Ok(ConversionResult::new());
        }

        let result = Mutex::new(ConversionResult::new());
        let finished = AtomicUsize::new(0);

        let convert_one = |id: &EntityId| -> Result<()> {
            let id = *id;
            match self.convert_single(&converter, &openings, id) {
                Ok(data) => {
                    let mut guard = match result.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    guard.insert(data);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.error(
                    format!("Skipping product that failed to convert: {error}"),
                    Some(id),
                    COMPONENT,
                ),
            }
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            self.reporter.progress(done as f64 / total as f64, COMPONENT);
            Ok(())
        };

        if self.settings.concurrent {
            products.par_iter().try_for_each(convert_one)?;
        } else {
            products.iter().try_for_each(convert_one)?;
        }

        Ok(match result.into_inner() {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        })
    }

    fn convert_single(
        &self,
        converter: &RepresentationConverter<'_>,
        openings: &FxHashMap<EntityId, Vec<EntityId>>,
        id: EntityId,
    ) -> Result<ProductShapeData> {
        let mut data = converter.convert_product(id)?;

        let mut opening_list = self.model.product(id)?.openings.clone();
        if let Some(linked) = openings.get(&id) {
            for &opening in linked {
                if !opening_list.contains(&opening) {
                    opening_list.push(opening);
                }
            }
        }
        converter.subtract_openings(&opening_list, &mut data)?;
        Ok(data)
    }
}

/// Opening product ids per host product, from voiding relationships
fn opening_index(model: &Model) -> FxHashMap<EntityId, Vec<EntityId>> {
    let mut index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
    for (_, entity) in model.iter() {
        if let Entity::RelVoids(rel) = entity {
            index
                .entry(rel.relating_element)
                .or_default()
                .push(rel.related_opening);
        }
    }
    for list in index.values_mut() {
        list.sort_unstable();
        list.dedup();
    }
    index
}
