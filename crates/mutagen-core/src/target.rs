//! The system mutations are applied to

/// Target system that script statements are executed against
///
/// Implementations block until the statement completes. Any error is treated
/// as a fault of the running mutation.
pub trait Target: Send + Sync {
    /// Execute one statement
    ///
    /// # Errors
    /// Returns whatever fault the target system reports.
    fn execute(&self, statement: &str) -> anyhow::Result<()>;
}

impl<T: Target + ?Sized> Target for &T {
    fn execute(&self, statement: &str) -> anyhow::Result<()> {
        (**self).execute(statement)
    }
}

impl<T: Target + ?Sized> Target for Box<T> {
    fn execute(&self, statement: &str) -> anyhow::Result<()> {
        (**self).execute(statement)
    }
}

impl<T: Target + ?Sized> Target for std::sync::Arc<T> {
    fn execute(&self, statement: &str) -> anyhow::Result<()> {
        (**self).execute(statement)
    }
}
