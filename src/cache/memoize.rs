//! Cached wrapper around an async function.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::store::{CacheOptions, CacheStore};

/// An async function whose successful results are cached per key.
///
/// Built with [`CacheStore::memoize`]. Errors are returned as-is and never cached.
pub struct Memoized<A, F, K> {
    cache: Arc<CacheStore>,
    func: F,
    key_fn: K,
    options: CacheOptions,
    _arg: PhantomData<fn(A)>,
}

impl<A, F, K> Memoized<A, F, K>
where
    K: Fn(&A) -> String,
{
    pub(crate) fn new(cache: Arc<CacheStore>, func: F, key_fn: K, options: CacheOptions) -> Self {
        Self {
            cache,
            func,
            key_fn,
            options,
            _arg: PhantomData,
        }
    }

    /// Cache key `arg` maps to.
    pub fn key_for(&self, arg: &A) -> String {
        (self.key_fn)(arg)
    }

    /// Return the cached result for `arg`, invoking the function on a miss.
    pub async fn call<Fut, T, E>(&self, arg: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
    {
        let key = self.key_for(&arg);
        if let Some(hit) = self.cache.get::<T>(&key) {
            return Ok(hit);
        }

        let value = (self.func)(arg).await?;
        self.cache.set(&key, &value, self.options.clone());
        Ok(value)
    }

    /// Drop the cached result for `arg`.
    pub fn forget(&self, arg: &A) -> bool {
        self.cache.delete(&self.key_for(arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_invokes_once_per_key_within_ttl() {
        let cache = Arc::new(CacheStore::in_memory(Duration::from_secs(60)));
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let square = cache.memoize(
            move |n: u32| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(n * n)
                }
            },
            |n: &u32| format!("square:{n}"),
            CacheOptions::default(),
        );

        assert_eq!(square.call(3).await, Ok(9));
        assert_eq!(square.call(3).await, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(square.call(4).await, Ok(16));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(square.forget(&3));
        assert_eq!(square.call(3).await, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reinvokes_after_ttl() {
        let cache = Arc::new(CacheStore::in_memory(Duration::from_secs(60)));
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let fetch = cache.memoize(
            move |_: ()| {
                let counter = counter.clone();
                async move { Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst)) }
            },
            |_: &()| "counter".to_string(),
            CacheOptions::ttl(Duration::from_millis(20)),
        );

        assert_eq!(fetch.call(()).await, Ok(0));
        assert_eq!(fetch.call(()).await, Ok(0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetch.call(()).await, Ok(1));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = Arc::new(CacheStore::in_memory(Duration::from_secs(60)));
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let flaky = cache.memoize(
            move |_: ()| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("boom".to_string())
                    } else {
                        Ok(7u8)
                    }
                }
            },
            |_: &()| "flaky".to_string(),
            CacheOptions::default(),
        );

        assert_eq!(flaky.call(()).await, Err("boom".to_string()));
        assert_eq!(flaky.call(()).await, Ok(7));
        assert_eq!(flaky.call(()).await, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
