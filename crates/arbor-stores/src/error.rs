/// Outcome of an [`AsyncAction`](crate::AsyncAction) call that did not
/// succeed.
#[derive(Debug, thiserror::Error)]
pub enum ActionError<E> {
    /// A previous call has not settled and the action rejects overlaps.
    #[error("action is in progress")]
    AlreadyInProgress,

    /// The operation itself failed.
    #[error("action failed: {0}")]
    Failed(E),
}

impl<E> ActionError<E> {
    /// The operation's error, if it ran and failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::AlreadyInProgress => None,
            Self::Failed(error) => Some(error),
        }
    }
}
