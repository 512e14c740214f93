/// Errors from the composition cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A reader panicked while holding the cache slot.
    #[error("composition cache lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;
