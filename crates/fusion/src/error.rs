use eagleeye_core::error::CoreError;
use eagleeye_store::StoreError;

/// Errors surfaced by the alarm manager and the heatmap aggregator.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
