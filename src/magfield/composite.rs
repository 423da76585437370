//! # Composite fields
//!
//! A [`CompositeField`] holds an ordered collection of field sources; the field at a point is the
//! component-wise sum of the members' fields at that point. It implements [`MagneticField`] so it
//! can be used anywhere a single source is used.
//!
//! Notes
//! -----------------
//! * Membership is edited through `&mut self` ([`CompositeField::add`], [`CompositeField::remove`]);
//!   once shared behind an `Arc` the composite is read-only and can be queried concurrently.
//! * [`CompositeField::max_field_magnitude`](MagneticField::max_field_magnitude) is the **maximum**
//!   of the members' bounds, not their sum. It is not a certified bound on the composite field:
//!   two overlapping sources can exceed it. Treat it as a heuristic.
use std::sync::Arc;

use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::constants::{Centimeter, Degree, KiloGauss};

use super::MagneticField;

/// Shared handle on a field source.
pub type FieldHandle = Arc<dyn MagneticField>;

/// A composition of multiple magnetic field sources.
#[derive(Debug, Clone)]
pub struct CompositeField {
    name: String,
    fields: SmallVec<[FieldHandle; 4]>,
}

impl CompositeField {
    pub fn new() -> Self {
        CompositeField {
            name: "composite".to_string(),
            fields: SmallVec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a source. Sources are summed in registration order.
    pub fn add(&mut self, field: FieldHandle) {
        self.fields.push(field);
    }

    /// Remove a source by handle identity.
    ///
    /// Return
    /// ----------
    /// * `true` if the source was a member.
    pub fn remove(&mut self, field: &FieldHandle) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| !Arc::ptr_eq(f, field));
        self.fields.len() != before
    }

    pub fn contains(&self, field: &FieldHandle) -> bool {
        self.fields.iter().any(|f| Arc::ptr_eq(f, field))
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldHandle> {
        self.fields.iter()
    }

    /// Names of the member sources, in registration order.
    pub fn member_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }
}

impl Default for CompositeField {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<FieldHandle> for CompositeField {
    fn from_iter<T: IntoIterator<Item = FieldHandle>>(iter: T) -> Self {
        let mut composite = CompositeField::new();
        composite.fields.extend(iter);
        composite
    }
}

impl MagneticField for CompositeField {
    fn field(&self, x: Centimeter, y: Centimeter, z: Centimeter, result: &mut Vector3<f64>) {
        let mut total = Vector3::zeros();
        for field in &self.fields {
            field.field(x, y, z, result);
            total += *result;
        }
        *result = total;
    }

    fn field_cylindrical(
        &self,
        phi: Degree,
        rho: Centimeter,
        z: Centimeter,
        result: &mut Vector3<f64>,
    ) {
        let mut total = Vector3::zeros();
        for field in &self.fields {
            field.field_cylindrical(phi, rho, z, result);
            total += *result;
        }
        *result = total;
    }

    /// For a composite field, all member fields must be ready. An empty composite is ready.
    fn is_field_loaded(&self) -> bool {
        self.fields.iter().all(|f| f.is_field_loaded())
    }

    fn max_field_magnitude(&self) -> KiloGauss {
        self.fields
            .iter()
            .map(|f| f.max_field_magnitude())
            .fold(0.0, f64::max)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod composite_test {
    use super::*;
    use crate::magfield::{grid_field::GridField, uniform::UniformField, FieldPoint};

    fn uniform(x: f64, y: f64, z: f64) -> FieldHandle {
        Arc::new(UniformField::kilogauss(Vector3::new(x, y, z)))
    }

    #[test]
    fn test_empty_composite() {
        let composite = CompositeField::new();
        assert!(composite.is_empty());
        assert!(composite.is_field_loaded());
        assert_eq!(composite.max_field_magnitude(), 0.0);

        let mut b = Vector3::repeat(9.0);
        composite.field(1.0, 2.0, 3.0, &mut b);
        assert_eq!(b, Vector3::zeros());
        composite.field_cylindrical(10.0, 2.0, 3.0, &mut b);
        assert_eq!(b, Vector3::zeros());
    }

    #[test]
    fn test_sum_of_members() {
        let a = uniform(1.0, 0.0, 2.0);
        let b = uniform(0.5, -3.0, 0.0);
        let composite: CompositeField = [a.clone(), b.clone()].into_iter().collect();

        let p = FieldPoint::Cylindrical {
            phi: 12.0,
            rho: 30.0,
            z: 1.0,
        };
        assert_eq!(composite.field_at(p), a.field_at(p) + b.field_at(p));
        assert_eq!(composite.len(), 2);
    }

    #[test]
    fn test_max_is_max_of_members_not_sum() {
        // two aligned 3 kG and 4 kG sources give a 7 kG field, yet the reported bound is 4 kG
        let composite: CompositeField = [uniform(0.0, 0.0, 3.0), uniform(0.0, 0.0, 4.0)]
            .into_iter()
            .collect();
        assert_eq!(composite.max_field_magnitude(), 4.0);
        assert_eq!(composite.field_magnitude(0.0, 0.0, 0.0), 7.0);
    }

    #[test]
    fn test_loaded_only_if_every_member_loaded() {
        let pending: FieldHandle = Arc::new(GridField::new("torus"));
        let mut composite = CompositeField::new().with_name("clas");
        composite.add(uniform(0.0, 0.0, 1.0));
        composite.add(pending.clone());

        assert!(!composite.is_field_loaded());
        assert!(composite.field_magnitude(0.0, 0.0, 0.0).is_nan());
        assert_eq!(composite.member_names(), vec!["uniform", "torus"]);

        assert!(composite.contains(&pending));
        assert!(composite.remove(&pending));
        assert!(!composite.remove(&pending));
        assert!(composite.is_field_loaded());
        assert_eq!(composite.name(), "clas");
    }

    #[test]
    fn test_remove_is_by_identity() {
        let a = uniform(1.0, 0.0, 0.0);
        let twin = uniform(1.0, 0.0, 0.0);
        let mut composite = CompositeField::new();
        composite.add(a.clone());

        assert!(!composite.remove(&twin));
        assert_eq!(composite.len(), 1);
        composite.clear();
        assert!(composite.is_empty());
    }
}
