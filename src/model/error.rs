use std::fmt;

/// Failures raised by channel and tag mutations.
#[derive(Debug)]
pub enum ModelError {
    /// The backing store rejected a statement.
    Store(anyhow::Error),
    /// The entity has never been written to the store.
    NotPersisted,
    EmptyName,
    DuplicateName { name: String },
    NameGenerationExhausted { attempts: usize },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Store(err) => write!(f, "store error: {err:#}"),
            ModelError::NotPersisted => write!(f, "tag has not been saved yet"),
            ModelError::EmptyName => write!(f, "tag name cannot be empty"),
            ModelError::DuplicateName { name } => {
                write!(f, "a tag named '{name}' already exists")
            }
            ModelError::NameGenerationExhausted { attempts } => write!(
                f,
                "could not generate a unique placeholder tag name after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Store(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Store(err)
    }
}

impl ModelError {
    /// Validation failures the user can fix by editing the form.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModelError::EmptyName | ModelError::DuplicateName { .. }
        )
    }
}
