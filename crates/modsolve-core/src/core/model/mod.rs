//! Model representation: symbols, equations, and the validated model system.

pub mod equations;
pub mod symbols;
pub mod system;

pub use equations::Equation;
pub use symbols::{Symbol, SymbolError, SymbolKind, SymbolTable};
pub use system::{IntegrationMethod, ModelError, ModelKind, ModelSystem, SolverSpec};
