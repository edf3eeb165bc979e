use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ClassifierError;

/// The closed set of vehicle classes this system recognizes.
///
/// The classifier itself is keyed by free-form string labels; this enum is
/// the domain vocabulary used at the edges (file naming, reporting) so that
/// typos never become phantom classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Bike,
    Truck,
    Motorbike,
    Other,
}

impl VehicleClass {
    /// All known classes, in stable id order.
    pub const ALL: [VehicleClass; 5] = [
        VehicleClass::Car,
        VehicleClass::Bike,
        VehicleClass::Truck,
        VehicleClass::Motorbike,
        VehicleClass::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bike => "bike",
            VehicleClass::Truck => "truck",
            VehicleClass::Motorbike => "motorbike",
            VehicleClass::Other => "other",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleClass::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| {
                ClassifierError::InvalidArgument(format!("unknown vehicle class '{}'", s))
            })
    }
}
