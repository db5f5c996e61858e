//! Built-in update rules, one file per rule.

mod driver;
mod pedestrian;
mod vehicle;

pub use driver::DriverRule;
pub use pedestrian::PedestrianRule;
pub use vehicle::VehicleRule;

use std::sync::Arc;

use crate::entity::Category;
use crate::stepper::{PriorityKey, RuleRegistry};

/// Registry with the built-in rules. Drivers are registered first so that an
/// entity classified both driver and pedestrian follows its vehicle.
pub fn standard_registry() -> RuleRegistry {
    RuleRegistry::new()
        .with_rule(Category::Driver, Arc::new(DriverRule))
        .with_rule(Category::Vehicle, Arc::new(VehicleRule))
        .with_rule(Category::Bicycle, Arc::new(VehicleRule))
        .with_rule(Category::Pedestrian, Arc::new(PedestrianRule))
}

/// Execution priority matching the built-in rules: vehicles move first so
/// drivers can snap to the fresh pose.
pub fn standard_priority() -> Vec<PriorityKey> {
    vec![
        PriorityKey::Category(Category::Vehicle),
        PriorityKey::Category(Category::Bicycle),
        PriorityKey::Category(Category::Pedestrian),
    ]
}
