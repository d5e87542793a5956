use thiserror::Error;
use types::CohortId;

#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("cohort {0} is not part of the instance")]
    UnknownCohort(CohortId),
}
