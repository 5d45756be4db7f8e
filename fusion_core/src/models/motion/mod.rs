// fusion_core/src/models/motion/mod.rs

use dyn_clone::DynClone;
use nalgebra::DMatrix;
use std::fmt::Debug;

use crate::state::StateVariable;
use crate::types::State;

/// A trait for motion models used within state estimators.
///
/// A motion model describes how a tracked object's state evolves over an interval `dt`
/// and how much uncertainty that interval adds. Models are plain configuration: every
/// method is a pure function of its arguments.
pub trait MotionModel: DynClone + Debug + Send + Sync {
    /// Returns the layout of the state vector this model evolves.
    /// The order of this Vec defines the indices for the state vector `x`.
    fn get_state_layout(&self) -> Vec<StateVariable>;

    /// Returns the total number of states (the length of the state vector `x`).
    fn get_state_dim(&self) -> usize {
        self.get_state_layout().len()
    }

    /// The state transition matrix `F` for an interval of `dt` seconds.
    ///
    /// Linear models ignore `x`. Nonlinear models return the Jacobian `∂f/∂x` evaluated at
    /// `x`. Must be the identity for `dt = 0`.
    fn get_transition_matrix(&self, x: &State, dt: f64) -> DMatrix<f64>;

    /// The process noise covariance `Q` accumulated over `dt` seconds.
    ///
    /// Must be zero for `dt = 0` and grow with `dt`.
    fn get_process_noise(&self, x: &State, dt: f64) -> DMatrix<f64>;

    /// Advances the mean by `dt` seconds.
    ///
    /// The default is the linear `F·x`; nonlinear models override this with their exact
    /// propagation.
    fn propagate(&self, x: &State, dt: f64) -> State {
        self.get_transition_matrix(x, dt) * x
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn MotionModel>`.
dyn_clone::clone_trait_object!(MotionModel);

pub mod constant_velocity;
pub mod ctrv;

pub use constant_velocity::ConstantVelocityModel;
pub use ctrv::CtrvModel;
