//! Entities: identifiers, capability classification, and the sparse typed
//! attribute store.
//!
//! Absence is meaningful — an unset attribute is not zero. The typed
//! accessors ([`Entity::speed`], [`Entity::yaw`], [`Entity::acceleration`])
//! fall back to deriving their value from velocity / acceleration components
//! when the scalar itself is unset.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::geometry::Footprint;

/// Stable entity identifier, unique within a scene and ordered so that
/// tiebreaks are deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability classification. An entity may carry several (a bicycle is also
/// update-ruled as a vehicle, a driver may itself be a pedestrian).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Vehicle,
    Bicycle,
    Pedestrian,
    Driver,
    Lane,
    Road,
    Crossing,
}

/// Attribute keys. Angles are degrees in `[0, 360)` counter-clockwise from
/// the positive x axis; rates are per second; lengths are meters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Attr {
    Speed,
    Yaw,
    YawRate,
    Acceleration,
    VelocityX,
    VelocityY,
    VelocityZ,
    AccelerationX,
    AccelerationY,
    AccelerationZ,
    Height,
    Length,
    Width,
    MaxYaw,
    MaxYawRate,
    VisibilityRange,
}

/// A scene participant: classification, optional footprint, sparse
/// attributes, and optional driving links. Every attribute key carries a
/// float value; entity-valued relations are the explicit driving links.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    categories: BTreeSet<Category>,
    footprint: Option<Footprint>,
    attributes: BTreeMap<Attr, f64>,
    /// Vehicle this entity drives, if any.
    pub pilots: Option<EntityId>,
    /// Driver steering this entity, if any.
    pub piloted_by: Option<EntityId>,
}

impl Entity {
    pub fn new(id: EntityId, categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            id,
            categories: categories.into_iter().collect(),
            footprint: None,
            attributes: BTreeMap::new(),
            pilots: None,
            piloted_by: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn classify(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    pub fn is_a(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn footprint(&self) -> Option<&Footprint> {
        self.footprint.as_ref()
    }

    pub fn set_footprint(&mut self, footprint: Footprint) {
        self.footprint = Some(footprint);
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }

    pub fn set_float(&mut self, attr: Attr, value: f64) {
        self.attributes.insert(attr, value);
    }

    pub fn with_float(mut self, attr: Attr, value: f64) -> Self {
        self.attributes.insert(attr, value);
        self
    }

    pub fn float(&self, attr: Attr) -> Option<f64> {
        self.attributes.get(&attr).copied()
    }

    /// Like [`float`](Entity::float) but absence is a hard error; for
    /// call sites where the attribute is a precondition rather than an input.
    pub fn require_float(&self, attr: Attr) -> Result<f64, SceneError> {
        self.float(attr).ok_or(SceneError::MissingAttribute {
            entity: self.id,
            attr,
        })
    }

    /// Every set attribute, in key order; feeds the stepper's copy and
    /// carry-over passes.
    pub fn attributes(&self) -> impl Iterator<Item = (Attr, f64)> + '_ {
        self.attributes.iter().map(|(k, v)| (*k, *v))
    }

    pub fn set_velocity(&mut self, vx: f64, vy: f64) {
        self.set_float(Attr::VelocityX, vx);
        self.set_float(Attr::VelocityY, vy);
    }

    /// Scalar speed. Falls back to the velocity-component magnitude, signed
    /// negative when the velocity bearing points into the rear half-plane
    /// (bearing strictly between 90° and 270°).
    pub fn speed(&self) -> Option<f64> {
        if let Some(v) = self.float(Attr::Speed) {
            return Some(v);
        }
        let (vx, vy) = self.velocity_xy()?;
        let magnitude = (vx * vx + vy * vy).sqrt();
        let bearing = vy.atan2(vx).to_degrees().rem_euclid(360.0);
        if bearing > 90.0 && bearing < 270.0 {
            Some(-magnitude)
        } else {
            Some(magnitude)
        }
    }

    /// Heading in degrees. Falls back to the velocity bearing.
    pub fn yaw(&self) -> Option<f64> {
        if let Some(v) = self.float(Attr::Yaw) {
            return Some(v);
        }
        let (vx, vy) = self.velocity_xy()?;
        Some(vy.atan2(vx).to_degrees().rem_euclid(360.0))
    }

    /// Scalar acceleration, derived from components like [`speed`].
    ///
    /// [`speed`]: Entity::speed
    pub fn acceleration(&self) -> Option<f64> {
        if let Some(v) = self.float(Attr::Acceleration) {
            return Some(v);
        }
        let ax = self.float(Attr::AccelerationX)?;
        let ay = self.float(Attr::AccelerationY)?;
        let magnitude = (ax * ax + ay * ay).sqrt();
        let bearing = ay.atan2(ax).to_degrees().rem_euclid(360.0);
        if bearing > 90.0 && bearing < 270.0 {
            Some(-magnitude)
        } else {
            Some(magnitude)
        }
    }

    pub fn yaw_rate(&self) -> Option<f64> {
        self.float(Attr::YawRate)
    }

    pub fn height(&self) -> Option<f64> {
        self.float(Attr::Height)
    }

    pub fn length(&self) -> Option<f64> {
        self.float(Attr::Length)
    }

    pub fn width(&self) -> Option<f64> {
        self.float(Attr::Width)
    }

    fn velocity_xy(&self) -> Option<(f64, f64)> {
        Some((
            self.float(Attr::VelocityX)?,
            self.float(Attr::VelocityY)?,
        ))
    }
}
