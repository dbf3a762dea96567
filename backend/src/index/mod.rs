//! Identifier index
//!
//! Self-balancing ordered map from project identifier to the open project's
//! shared record. Supports point lookup and inclusive range enumeration.

pub mod tree;
pub mod validation;

pub use tree::{Color, IdentifierIndex, IndexError};
pub use validation::InvariantViolation;
