/// A request executed through the pipeline.
///
/// Queries are commands too: they pass the same validation and run inside a
/// unit of work that simply has nothing to commit.
pub trait Command: Send + Sync + 'static {
    /// Stable name used for logging and metric labels.
    const NAME: &'static str;

    /// What a successful execution returns.
    type Output: Send + 'static;
}
