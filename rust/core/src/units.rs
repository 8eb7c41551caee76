// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit conversion context
//!
//! Models declare their length and plane-angle units in the project header;
//! importers resolve them into plain multipliers here. The angular unit
//! keeps an explicit `Undefined` state because real files omit it, and the
//! geometry crate then falls back to a value-range heuristic when
//! interpreting raw angles.

/// Plane angle unit as declared by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AngularUnit {
    #[default]
    Radian,
    Degree,
    /// No usable plane-angle unit was declared
    Undefined,
}

/// Length and angle conversion factors for one model
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitContext {
    /// Multiplier taking stored lengths to meters (e.g. 0.001 for mm)
    pub length_factor: f64,
    /// Multiplier taking stored plane angles to radians
    pub plane_angle_factor: f64,
    /// Declared plane-angle unit
    pub angular_unit: AngularUnit,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            length_factor: 1.0,
            plane_angle_factor: 1.0,
            angular_unit: AngularUnit::Radian,
        }
    }
}

impl UnitContext {
    /// Meters/radians context (no conversion)
    pub fn si() -> Self {
        Self::default()
    }

    /// Millimeter lengths, radian angles
    pub fn millimeters() -> Self {
        Self {
            length_factor: 0.001,
            ..Self::default()
        }
    }

    /// Degree angles with the matching factor
    pub fn with_degrees(mut self) -> Self {
        self.plane_angle_factor = std::f64::consts::PI / 180.0;
        self.angular_unit = AngularUnit::Degree;
        self
    }

    /// Drop the declared angular unit (forces the downstream heuristic)
    pub fn with_undefined_angles(mut self) -> Self {
        self.plane_angle_factor = 1.0;
        self.angular_unit = AngularUnit::Undefined;
        self
    }
}
