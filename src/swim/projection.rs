//! # 2D projected trajectories and the proximity query
//!
//! A view projects every position of a [`SwimTrajectory`] onto its own plane through a
//! [`Projector`]. The resulting polylines ([`SwimTrajectory2D`]) answer the question "which
//! trajectory is closest to this point?" used for hovering and selection.
//!
//! Distances are measured to the polyline segments, not only to the vertices.
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use nalgebra::{Point2, Point3};
use tracing::trace;

use super::{
    registry::{TrajectoryKind, TrajectoryRegistry},
    trajectory::SwimTrajectory,
};

/// Maps a 3D position (m) onto a caller-defined plane.
///
/// Any `Fn(&Point3<f64>) -> Point2<f64>` is a projector.
pub trait Projector {
    fn project(&self, position: &Point3<f64>) -> Point2<f64>;
}

impl<F> Projector for F
where
    F: Fn(&Point3<f64>) -> Point2<f64>,
{
    fn project(&self, position: &Point3<f64>) -> Point2<f64> {
        self(position)
    }
}

/// A trajectory projected onto a view plane, with a back-reference to the 3D trajectory.
#[derive(Debug, Clone)]
pub struct SwimTrajectory2D {
    trajectory: Arc<SwimTrajectory>,
    path: Vec<Point2<f64>>,
}

impl SwimTrajectory2D {
    pub fn new(trajectory: Arc<SwimTrajectory>, projector: &impl Projector) -> Self {
        let path = trajectory
            .positions()
            .map(|p| projector.project(&p))
            .collect();
        SwimTrajectory2D { trajectory, path }
    }

    /// The projected polyline.
    pub fn path(&self) -> &[Point2<f64>] {
        &self.path
    }

    pub fn trajectory_3d(&self) -> &Arc<SwimTrajectory> {
        &self.trajectory
    }

    /// Minimum distance from `point` to the polyline.
    ///
    /// Return
    /// ----------
    /// * The point-to-segment minimum, the point distance for a one point path, `+∞` for an
    ///   empty path.
    pub fn closest_distance(&self, point: &Point2<f64>) -> f64 {
        match self.path.as_slice() {
            [] => f64::INFINITY,
            [single] => nalgebra::distance(single, point),
            path => path
                .iter()
                .tuple_windows()
                .map(|(a, b)| segment_distance(a, b, point))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

impl fmt::Display for SwimTrajectory2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trajectory)
    }
}

/// Distance from `p` to the segment `[a, b]`.
fn segment_distance(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return nalgebra::distance(a, p);
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    nalgebra::distance(&(a + ab * t), p)
}

/// Result of a proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    /// minimum distance, `+∞` when nothing was selected
    pub distance: f64,
    /// index of the closest trajectory in the queried slice
    pub index: Option<usize>,
}

impl ClosestApproach {
    pub fn none() -> Self {
        ClosestApproach {
            distance: f64::INFINITY,
            index: None,
        }
    }
}

/// Find the trajectory closest to `point`.
///
/// The first trajectory in iteration order wins ties. An empty slice gives
/// `(+∞, None)`.
pub fn closest_approach(trajectories: &[SwimTrajectory2D], point: &Point2<f64>) -> ClosestApproach {
    let mut best = ClosestApproach::none();
    for (index, trajectory) in trajectories.iter().enumerate() {
        let distance = trajectory.closest_distance(point);
        if distance < best.distance {
            best = ClosestApproach {
                distance,
                index: Some(index),
            };
        }
    }
    best
}

/// Which registry collections a view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFilter {
    pub show_monte_carlo: bool,
    pub show_reconstructed: bool,
}

impl Default for DisplayFilter {
    fn default() -> Self {
        DisplayFilter {
            show_monte_carlo: true,
            show_reconstructed: true,
        }
    }
}

impl DisplayFilter {
    pub fn shows(&self, kind: TrajectoryKind) -> bool {
        match kind {
            TrajectoryKind::MonteCarlo => self.show_monte_carlo,
            TrajectoryKind::Reconstructed => self.show_reconstructed,
        }
    }
}

type Veto = Box<dyn Fn(&SwimTrajectory) -> bool + Send + Sync>;

/// The projected trajectories of one view.
///
/// Rebuilt from a registry snapshot each time the view redraws. The veto is local to the view:
/// a vetoed trajectory is skipped here and left untouched in the registry.
pub struct ProjectedTrajectories {
    filter: DisplayFilter,
    veto: Option<Veto>,
    trajectories: Vec<SwimTrajectory2D>,
    closest: Option<usize>,
}

impl Default for ProjectedTrajectories {
    fn default() -> Self {
        Self::new(DisplayFilter::default())
    }
}

impl ProjectedTrajectories {
    pub fn new(filter: DisplayFilter) -> Self {
        ProjectedTrajectories {
            filter,
            veto: None,
            trajectories: Vec::new(),
            closest: None,
        }
    }

    /// Skip every trajectory for which `veto` returns `true`.
    pub fn with_veto<F>(mut self, veto: F) -> Self
    where
        F: Fn(&SwimTrajectory) -> bool + Send + Sync + 'static,
    {
        self.veto = Some(Box::new(veto));
        self
    }

    pub fn filter(&self) -> DisplayFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: DisplayFilter) {
        self.filter = filter;
    }

    fn vetoed(&self, trajectory: &SwimTrajectory) -> bool {
        self.veto.as_ref().is_some_and(|veto| veto(trajectory))
    }

    /// Re-project the registry content, Monte-Carlo first then reconstructed.
    ///
    /// Return
    /// ----------
    /// * The number of projected trajectories.
    pub fn rebuild(&mut self, registry: &TrajectoryRegistry, projector: &impl Projector) -> usize {
        self.trajectories.clear();
        self.closest = None;

        for kind in [TrajectoryKind::MonteCarlo, TrajectoryKind::Reconstructed] {
            if !self.filter.shows(kind) {
                continue;
            }
            let Some(snapshot) = registry.trajectories(kind) else {
                continue;
            };

            let projected: Vec<_> = snapshot
                .iter()
                .filter(|t| !self.vetoed(t))
                .map(|t| SwimTrajectory2D::new(Arc::clone(t), projector))
                .collect();
            trace!(%kind, available = snapshot.len(), projected = projected.len(), "projected");
            self.trajectories.extend(projected);
        }

        self.trajectories.len()
    }

    pub fn trajectories(&self) -> &[SwimTrajectory2D] {
        &self.trajectories
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Run the proximity query and remember the winner.
    pub fn closest_approach(&mut self, point: &Point2<f64>) -> ClosestApproach {
        let approach = closest_approach(&self.trajectories, point);
        self.closest = approach.index;
        approach
    }

    /// The winner of the last [`ProjectedTrajectories::closest_approach`], if any.
    pub fn closest_trajectory(&self) -> Option<&SwimTrajectory2D> {
        self.closest.and_then(|i| self.trajectories.get(i))
    }
}

impl fmt::Debug for ProjectedTrajectories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectedTrajectories")
            .field("filter", &self.filter)
            .field("veto", &self.veto.is_some())
            .field("trajectories", &self.trajectories.len())
            .field("closest", &self.closest)
            .finish()
    }
}
