use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transaction error: {0}")]
    Tx(String),

    /// Raised by a transaction closure to force a rollback. The string is
    /// a short tag the caller can match on to recover the domain reason.
    #[error("transaction aborted: {0}")]
    Aborted(String),
}
