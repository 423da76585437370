//! # Particle identity
//!
//! * [`GeneratedParticleRecord`] – charge and generating kinematics of a swum particle.
//! * [`LundId`] – optional particle-type identifier (Lund/PDG numbering), known when the
//!   trajectory comes from Monte-Carlo truth.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{initial_state_vector, Degree, GeVc, Meter, StateVector};

/// The particle that was swum: charge, vertex and initial momentum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedParticleRecord {
    /// charge in units of e (-1 for electron, +1 for proton, etc.)
    pub charge: i32,
    /// vertex x in m
    pub vertex_x: Meter,
    /// vertex y in m
    pub vertex_y: Meter,
    /// vertex z in m
    pub vertex_z: Meter,
    /// initial momentum in GeV/c
    pub momentum: GeVc,
    /// initial polar angle in degrees
    pub theta: Degree,
    /// initial azimuthal angle in degrees
    pub phi: Degree,
}

impl GeneratedParticleRecord {
    pub fn new(
        charge: i32,
        vertex_x: Meter,
        vertex_y: Meter,
        vertex_z: Meter,
        momentum: GeVc,
        theta: Degree,
        phi: Degree,
    ) -> Self {
        GeneratedParticleRecord {
            charge,
            vertex_x,
            vertex_y,
            vertex_z,
            momentum,
            theta,
            phi,
        }
    }

    /// The state vector at the vertex.
    pub fn initial_state_vector(&self) -> StateVector {
        initial_state_vector(
            self.vertex_x,
            self.vertex_y,
            self.vertex_z,
            self.theta,
            self.phi,
        )
    }
}

impl fmt::Display for GeneratedParticleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q {:+} p {:.3} GeV/c θ {:.2}° φ {:.2}° vertex ({:.3}, {:.3}, {:.3}) m",
            self.charge,
            self.momentum,
            self.theta,
            self.phi,
            self.vertex_x,
            self.vertex_y,
            self.vertex_z
        )
    }
}

/// Broad particle family, used for classification of Monte-Carlo tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleType {
    Lepton,
    Meson,
    Baryon,
    Interboson,
    Nucleus,
    Unknown,
}

/// Particle-type identifier in the Lund (PDG) numbering scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LundId {
    id: i32,
    name: String,
    particle_type: ParticleType,
    /// charge in units of e
    charge: i32,
    /// mass in GeV/c²
    mass: f64,
}

/// (id, name, type, charge, mass) of the particles most often met in events.
const LUND_TABLE: &[(i32, &str, ParticleType, i32, f64)] = &[
    (11, "e-", ParticleType::Lepton, -1, 0.000510999),
    (-11, "e+", ParticleType::Lepton, 1, 0.000510999),
    (13, "mu-", ParticleType::Lepton, -1, 0.105658),
    (-13, "mu+", ParticleType::Lepton, 1, 0.105658),
    (12, "nu_e", ParticleType::Lepton, 0, 0.0),
    (14, "nu_mu", ParticleType::Lepton, 0, 0.0),
    (22, "gamma", ParticleType::Interboson, 0, 0.0),
    (111, "pi0", ParticleType::Meson, 0, 0.134977),
    (211, "pi+", ParticleType::Meson, 1, 0.139570),
    (-211, "pi-", ParticleType::Meson, -1, 0.139570),
    (321, "K+", ParticleType::Meson, 1, 0.493677),
    (-321, "K-", ParticleType::Meson, -1, 0.493677),
    (311, "K0", ParticleType::Meson, 0, 0.497611),
    (2212, "p", ParticleType::Baryon, 1, 0.938272),
    (-2212, "pbar", ParticleType::Baryon, -1, 0.938272),
    (2112, "n", ParticleType::Baryon, 0, 0.939565),
    (3122, "Lambda", ParticleType::Baryon, 0, 1.115683),
    (45, "deuteron", ParticleType::Nucleus, 1, 1.875613),
    (47, "alpha", ParticleType::Nucleus, 2, 3.727379),
];

impl LundId {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        particle_type: ParticleType,
        charge: i32,
        mass: f64,
    ) -> Self {
        LundId {
            id,
            name: name.into(),
            particle_type,
            charge,
            mass,
        }
    }

    /// Look up a known particle by its Lund id.
    pub fn from_id(id: i32) -> Option<LundId> {
        LUND_TABLE
            .iter()
            .find(|(lid, ..)| *lid == id)
            .map(|&(id, name, particle_type, charge, mass)| {
                LundId::new(id, name, particle_type, charge, mass)
            })
    }

    /// Look up a known particle by name (case-sensitive, e.g. `"pi+"`).
    pub fn from_name(name: &str) -> Option<LundId> {
        LUND_TABLE
            .iter()
            .find(|(_, n, ..)| *n == name)
            .and_then(|&(id, ..)| LundId::from_id(id))
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn particle_type(&self) -> ParticleType {
        self.particle_type
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Particles have a non-negative id, antiparticles a negative one.
    pub fn is_antiparticle(&self) -> bool {
        self.id < 0
    }
}

impl fmt::Display for LundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
