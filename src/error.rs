use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgateError {
    #[error("Failed to fetch branch {branch}: {reason}. Make sure the branch exists and is accessible.")]
    BranchFetch { branch: String, reason: String },

    #[error("Invalid threshold '{value}': {reason}")]
    InvalidThreshold { value: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CovgateError>;
