//! Cry classifier port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::analysis::ClassificationResult;
use crate::domain::recording::AudioArtifact;

/// Classification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("Classifier unreachable: {0}")]
    Unreachable(String),

    #[error("Classifier returned a bad response: {0}")]
    BadResponse(String),
}

/// Port for the remote cry classifier
#[async_trait]
pub trait CryClassifier: Send + Sync {
    /// Upload the artifact and interpret the classifier's answer
    async fn classify(&self, artifact: &AudioArtifact) -> Result<ClassificationResult, ClassifyError>;
}
