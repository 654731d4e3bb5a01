use serde::{Deserialize, Serialize};

use crate::errors::{AsmError, Result};

/// Angular tolerance shared by every container
///
/// Fixed by the kernel; callers can read it but never change it.
pub const ANGULAR_TOLERANCE: f64 = 1e-10;

/// Default positional tolerance in model units
pub const DEFAULT_POSITIONAL_TOLERANCE: f64 = 1e-6;

/// Customer info block carried by every container
///
/// This is the block persisted with a container and handed to the manager
/// factory on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Millimetres per model length unit
    pub mm_per_unit: f64,

    /// Positional tolerance in model units
    pub positional_tolerance: f64,

    /// Human-readable container name
    pub name: String,

    /// Whether the container owns a composite root
    pub has_composite_root: bool,
}

impl CustomerInfo {
    /// Create an info block with default units and tolerances
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            mm_per_unit: 1.0,
            positional_tolerance: DEFAULT_POSITIONAL_TOLERANCE,
            name: name.into(),
            has_composite_root: false,
        }
    }

    /// Builder-style unit scale
    pub fn with_mm_per_unit(mut self, mm_per_unit: f64) -> Self {
        self.mm_per_unit = mm_per_unit;
        self
    }

    /// Builder-style positional tolerance
    pub fn with_positional_tolerance(mut self, tolerance: f64) -> Self {
        self.positional_tolerance = tolerance;
        self
    }

    pub fn angular_tolerance(&self) -> f64 {
        ANGULAR_TOLERANCE
    }

    /// Check the unit scale is a finite positive length
    ///
    /// # Errors
    /// * `InvalidUnitScale` - Zero, negative, NaN or infinite `mm_per_unit`
    pub fn validate(&self) -> Result<()> {
        if self.mm_per_unit.is_finite() && self.mm_per_unit > 0.0 {
            Ok(())
        } else {
            Err(AsmError::InvalidUnitScale {
                name: self.name.clone(),
                mm_per_unit: self.mm_per_unit,
            })
        }
    }

    /// Length ratio converting this container's units into `parent`'s units
    ///
    /// # Errors
    /// * `InvalidUnitScale` - Either block carries an unusable unit scale
    pub fn unit_ratio_into(&self, parent: &CustomerInfo) -> Result<f64> {
        self.validate()?;
        parent.validate()?;
        Ok(self.mm_per_unit / parent.mm_per_unit)
    }
}

impl Default for CustomerInfo {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = CustomerInfo::new("bracket");
        assert_eq!(info.name, "bracket");
        assert_eq!(info.mm_per_unit, 1.0);
        assert_eq!(info.positional_tolerance, DEFAULT_POSITIONAL_TOLERANCE);
        assert!(!info.has_composite_root);
        assert_eq!(info.angular_tolerance(), ANGULAR_TOLERANCE);
    }

    #[test]
    fn test_unit_ratio() {
        let metres = CustomerInfo::new("m").with_mm_per_unit(1000.0);
        let millimetres = CustomerInfo::new("mm");
        assert_eq!(metres.unit_ratio_into(&millimetres).unwrap(), 1000.0);
        assert_eq!(millimetres.unit_ratio_into(&metres).unwrap(), 0.001);
    }

    #[test]
    fn test_rejects_unusable_unit_scales() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let info = CustomerInfo::new("bad").with_mm_per_unit(bad);
            assert!(matches!(
                info.validate(),
                Err(AsmError::InvalidUnitScale { .. })
            ));
            assert!(CustomerInfo::new("mm").unit_ratio_into(&info).is_err());
        }
        assert!(CustomerInfo::new("mm").validate().is_ok());
    }
}
