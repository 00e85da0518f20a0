use thiserror::Error;

/// Precondition violations raised by target and decoration operations.
///
/// None of these are fatal: the issuing command reports the failure and the
/// simulation carries on unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("Target not found: '{0}'")]
    NotFound(String),

    #[error("A target labelled '{0}' already exists")]
    DuplicateLabel(String),

    #[error("Target '{label}' already logs a mapping for bead type {new_type}")]
    DuplicateTypeMapping { label: String, new_type: usize },

    #[error("Target '{label}' cannot map bead type {bead_type} onto itself")]
    IdentityTypeMapping { label: String, bead_type: usize },

    #[error("Target '{label}' has no logged mapping for bead type {new_type}")]
    MissingTypeMapping { label: String, new_type: usize },

    #[error("Target '{0}' contains no beads")]
    EmptyTarget(String),

    #[error("Adding '{child}' to '{parent}' would make a target contain itself")]
    WouldCreateCycle { parent: String, child: String },

    #[error("Target '{0}' is not a composite target")]
    NotComposite(String),

    #[error("Target '{0}' is not a simple bead target")]
    NotSimple(String),

    #[error("Composite '{parent}' has no direct child '{child}'")]
    ChildNotFound { parent: String, child: String },

    #[error("No active decoration labelled '{0}'")]
    DecoratorNotFound(String),

    #[error("Activity window is empty: start step {start} is after end step {end}")]
    InvalidWindow { start: u64, end: u64 },
}
