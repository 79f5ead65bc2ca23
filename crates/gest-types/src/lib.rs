//! # gest-types
//!
//! The VOCS schema (variables, objectives, constraints, constants and
//! observables), the point values exchanged with generators, and the error
//! types shared by the gest crates.

pub mod constant;
pub mod constraint;
pub mod errors;
mod longhand;
pub mod objective;
pub mod value;
pub mod variable;
pub mod vocs;

pub use constant::*;
pub use constraint::*;
pub use errors::*;
pub use objective::*;
pub use value::*;
pub use variable::*;
pub use vocs::*;
