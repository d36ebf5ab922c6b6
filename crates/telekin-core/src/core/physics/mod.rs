pub mod fit;
pub mod integrator;
pub mod kinematics;
pub mod stopping;
pub mod straggling;
