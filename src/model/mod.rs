//! Fleet-transition optimisation model.

pub mod builder;
pub mod problem;
pub mod variant;

pub use builder::{FleetTransitionModel, ModelError, Retirement, retirement};
pub use problem::{
    Constraint, Domain, Entity, LinearExpr, Problem, Sense, VarHandle, VarId, VarKind, VariableDef,
};
pub use variant::ModelVariant;
