//! Application Use Cases

mod execute_structure;
mod open_structure;
mod reconcile_structure;

pub use execute_structure::ExecuteStructureUseCase;
pub use open_structure::{
    OpenStructureUseCase, RunError, RunReport, StructureKind, StructureSettings,
};
pub use reconcile_structure::ReconcileStructureUseCase;
