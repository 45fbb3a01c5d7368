//! Base trait for executable components.

/// Trait for running a component until completion or error.
pub trait Runner {
    /// Error type for execution failures.
    type Error;

    /// Executes the component until completion or error.
    fn run(self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send
    where
        Self: Sized;
}
