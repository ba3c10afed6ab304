//! Concrete layer types

pub mod elementwise;
pub mod input;

pub use elementwise::{AddElement, AddOp, BinaryOp, ElementwiseLayer, MulOp, MultiplyElement, SubOp, SubtractElement};
pub use input::Input;
