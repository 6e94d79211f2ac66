use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("`{path}` is outside the project directory `{root}`")]
    OutsideProject { path: String, root: String },
    #[error("`{path}` is not representable as an archive member name")]
    Unrepresentable { path: String },
}

impl DomainError {
    pub fn outside_project(path: impl Into<String>, root: impl Into<String>) -> Self {
        Self::OutsideProject {
            path: path.into(),
            root: root.into(),
        }
    }

    pub fn unrepresentable(path: impl Into<String>) -> Self {
        Self::Unrepresentable { path: path.into() }
    }
}
