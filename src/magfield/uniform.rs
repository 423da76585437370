//! Uniform magnetic fields

use nalgebra::Vector3;

use crate::constants::{Centimeter, Degree, KiloGauss, KG_PER_GAUSS, KG_PER_TESLA};

use super::MagneticField;

/// A constant field of the form `B = [ B_x, B_y, B_z ]`, everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    name: String,
    /// Vector field components with respect to the x,y,z cartesian axes, in kilogauss.
    field: Vector3<KiloGauss>,
}

impl UniformField {
    /// Create a UniformField with components specified in kilogauss.
    pub fn kilogauss(components: Vector3<f64>) -> UniformField {
        UniformField {
            name: "uniform".to_string(),
            field: components,
        }
    }

    /// Create a UniformField with components specified in gauss.
    pub fn gauss(components: Vector3<f64>) -> UniformField {
        UniformField::kilogauss(components * KG_PER_GAUSS)
    }

    /// Create a UniformField with components specified in tesla.
    pub fn tesla(components: Vector3<f64>) -> UniformField {
        UniformField::kilogauss(components * KG_PER_TESLA)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn components(&self) -> &Vector3<KiloGauss> {
        &self.field
    }
}

impl MagneticField for UniformField {
    fn field(&self, _x: Centimeter, _y: Centimeter, _z: Centimeter, result: &mut Vector3<f64>) {
        result.copy_from(&self.field);
    }

    fn field_cylindrical(
        &self,
        _phi: Degree,
        _rho: Centimeter,
        _z: Centimeter,
        result: &mut Vector3<f64>,
    ) {
        result.copy_from(&self.field);
    }

    fn is_field_loaded(&self) -> bool {
        true
    }

    fn max_field_magnitude(&self) -> KiloGauss {
        self.field.norm()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
