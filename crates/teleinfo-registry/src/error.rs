/// Errors that can occur when addressing the field table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The label is not part of the fixed table.
    #[error("unknown label: {0}")]
    UnknownLabel(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
