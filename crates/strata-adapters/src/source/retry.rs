//! Timeout retry decorator for layer sources.

use std::time::Duration;

use tracing::warn;

use strata_core::{
    application::{FetchOptions, LayerSource, LoadError},
    domain::StagingArea,
};

/// Retries the wrapped source when it times out.
///
/// Each attempt stages into a scratch area, so a timed-out attempt never
/// leaves partial files behind. Other failures are returned at once.
pub struct RetryingSource<S> {
    inner: S,
}

impl<S: LayerSource> RetryingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: LayerSource> LayerSource for RetryingSource<S> {
    fn fetch(
        &self,
        locator: &str,
        staging: &mut StagingArea,
        options: &FetchOptions,
    ) -> Result<Duration, LoadError> {
        let attempts = options.max_retries.saturating_add(1);
        let mut spent = Duration::ZERO;

        for attempt in 1..=attempts {
            let mut scratch = StagingArea::new();
            match self.inner.fetch(locator, &mut scratch, options) {
                Ok(elapsed) => {
                    for path in scratch.paths() {
                        if let Some(bytes) = scratch.read(path) {
                            staging.write(path, bytes).map_err(|e| LoadError::Other {
                                locator: locator.to_string(),
                                reason: e.to_string(),
                            })?;
                        }
                    }
                    return Ok(spent + elapsed);
                }
                Err(e) if e.is_timeout() => {
                    spent += options.timeout;
                    warn!(locator, attempt, attempts, "Template fetch timed out");
                }
                Err(e) => return Err(e),
            }
        }

        Err(LoadError::Timeout {
            locator: locator.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Times out for the first `failures` calls.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl LayerSource for Flaky {
        fn fetch(
            &self,
            locator: &str,
            staging: &mut StagingArea,
            _options: &FetchOptions,
        ) -> Result<Duration, LoadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            staging.write("template/partial.txt", b"x".to_vec()).unwrap();
            if call < self.failures {
                return Err(LoadError::Timeout {
                    locator: locator.to_string(),
                    attempts: 1,
                });
            }
            staging.write("template/done.txt", b"ok".to_vec()).unwrap();
            Ok(Duration::from_millis(5))
        }
    }

    fn options(max_retries: u32) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_millis(10),
            max_retries,
            proxy: None,
        }
    }

    #[test]
    fn retries_until_success() {
        let source = RetryingSource::new(Flaky::new(2));
        let mut staging = StagingArea::new();

        let spent = source.fetch("t", &mut staging, &options(3)).unwrap();

        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(spent, Duration::from_millis(25));
        assert!(staging.exists("template/done.txt"));
    }

    #[test]
    fn gives_up_after_max_retries() {
        let source = RetryingSource::new(Flaky::new(10));
        let mut staging = StagingArea::new();

        let err = source.fetch("t", &mut staging, &options(3)).unwrap_err();

        assert_eq!(
            err,
            LoadError::Timeout {
                locator: "t".into(),
                attempts: 4
            }
        );
        assert!(staging.is_empty());
    }

    #[test]
    fn not_found_is_not_retried() {
        struct Missing(AtomicU32);
        impl LayerSource for Missing {
            fn fetch(
                &self,
                locator: &str,
                _staging: &mut StagingArea,
                _options: &FetchOptions,
            ) -> Result<Duration, LoadError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(LoadError::NotFound {
                    locator: locator.to_string(),
                })
            }
        }

        let source = RetryingSource::new(Missing(AtomicU32::new(0)));
        let err = source
            .fetch("t", &mut StagingArea::new(), &options(3))
            .unwrap_err();

        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(source.inner().0.load(Ordering::SeqCst), 1);
    }
}
