//! Three-tier memoizing cache over the boundary lookup service.
//!
//! One tier per administrative level: the state list, districts keyed by
//! state code, blocks keyed by district code. Writes are additive only
//! (new parent-key entries, never overwrites), so concurrent readers
//! never observe a torn entry. There is no eviction; a cache lives for
//! one page session and a fresh session starts empty.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::Shared;
use parking_lot::Mutex;

use crate::normalize::title_case;
use crate::service::{Boundary, BoundaryCode, BoundaryService, BoxFuture, FetchError};

type FetchResult = Result<Arc<Vec<Boundary>>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Default)]
struct CacheState {
    states: Option<Arc<Vec<Boundary>>>,
    states_inflight: Option<SharedFetch>,
    districts: BTreeMap<BoundaryCode, Arc<Vec<Boundary>>>,
    districts_inflight: BTreeMap<BoundaryCode, SharedFetch>,
    blocks: BTreeMap<BoundaryCode, Arc<Vec<Boundary>>>,
    blocks_inflight: BTreeMap<BoundaryCode, SharedFetch>,
}

struct CacheInner {
    service: Arc<dyn BoundaryService>,
    state: Mutex<CacheState>,
}

/// Memoizing boundary cache with request coalescing.
///
/// Handles are cheap to clone and share one underlying store. Concurrent
/// callers asking for the same parent code ride a single shared fetch;
/// a failed fetch caches nothing, so the next call may retry. The lock
/// is never held across an await point.
#[derive(Clone)]
pub struct BoundaryCache {
    inner: Arc<CacheInner>,
}

impl BoundaryCache {
    pub fn new(service: Arc<dyn BoundaryService>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                service,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// State list, fetched at most once per session.
    pub async fn states(&self) -> FetchResult {
        let fut = {
            let mut st = self.inner.state.lock();
            if let Some(list) = &st.states {
                return Ok(list.clone());
            }
            if let Some(fut) = &st.states_inflight {
                fut.clone()
            } else {
                let inner = self.inner.clone();
                let fut: SharedFetch = async move {
                    let fetched = inner.service.fetch_states().await;
                    let mut st = inner.state.lock();
                    st.states_inflight = None;
                    let list = Arc::new(normalize_all(fetched?));
                    Ok(st.states.get_or_insert(list).clone())
                }
                .boxed()
                .shared();
                st.states_inflight = Some(fut.clone());
                fut
            }
        };
        fut.await
    }

    /// Districts of one state: synchronous when warm, otherwise exactly
    /// one fetch for that state code regardless of concurrent callers.
    pub async fn districts(&self, state: &BoundaryCode) -> FetchResult {
        let fut = {
            let mut st = self.inner.state.lock();
            if let Some(list) = st.districts.get(state) {
                return Ok(list.clone());
            }
            if let Some(fut) = st.districts_inflight.get(state) {
                fut.clone()
            } else {
                let inner = self.inner.clone();
                let key = state.clone();
                let fut: SharedFetch = async move {
                    let fetched = inner.service.fetch_districts(key.clone()).await;
                    let mut st = inner.state.lock();
                    st.districts_inflight.remove(&key);
                    let list = Arc::new(normalize_all(fetched?));
                    Ok(st.districts.entry(key).or_insert(list).clone())
                }
                .boxed()
                .shared();
                st.districts_inflight.insert(state.clone(), fut.clone());
                fut
            }
        };
        fut.await
    }

    /// Blocks of one district, same contract as [`Self::districts`].
    pub async fn blocks(&self, district: &BoundaryCode) -> FetchResult {
        let fut = {
            let mut st = self.inner.state.lock();
            if let Some(list) = st.blocks.get(district) {
                return Ok(list.clone());
            }
            if let Some(fut) = st.blocks_inflight.get(district) {
                fut.clone()
            } else {
                let inner = self.inner.clone();
                let key = district.clone();
                let fut: SharedFetch = async move {
                    let fetched = inner.service.fetch_blocks(key.clone()).await;
                    let mut st = inner.state.lock();
                    st.blocks_inflight.remove(&key);
                    let list = Arc::new(normalize_all(fetched?));
                    Ok(st.blocks.entry(key).or_insert(list).clone())
                }
                .boxed()
                .shared();
                st.blocks_inflight.insert(district.clone(), fut.clone());
                fut
            }
        };
        fut.await
    }

    pub fn cached_states(&self) -> Option<Arc<Vec<Boundary>>> {
        self.inner.state.lock().states.clone()
    }

    pub fn cached_districts(&self, state: &BoundaryCode) -> Option<Arc<Vec<Boundary>>> {
        self.inner.state.lock().districts.get(state).cloned()
    }

    pub fn cached_blocks(&self, district: &BoundaryCode) -> Option<Arc<Vec<Boundary>>> {
        self.inner.state.lock().blocks.get(district).cloned()
    }

    /// Districts of one state, filtered for a selection control.
    pub async fn districts_for_selection(
        &self,
        state: &BoundaryCode,
    ) -> Result<Vec<Boundary>, FetchError> {
        Ok(selection_entries(&self.districts(state).await?))
    }

    /// Blocks of one district, filtered for a selection control.
    pub async fn blocks_for_selection(
        &self,
        district: &BoundaryCode,
    ) -> Result<Vec<Boundary>, FetchError> {
        Ok(selection_entries(&self.blocks(district).await?))
    }
}

/// Entries suitable for a selection control. Inactive regions stay in
/// the cache for name resolution but are never offered for selection.
pub fn selection_entries(list: &[Boundary]) -> Vec<Boundary> {
    list.iter().filter(|b| b.active).cloned().collect()
}

fn normalize_all(list: Vec<Boundary>) -> Vec<Boundary> {
    list.into_iter()
        .map(|b| Boundary {
            name: title_case(&b.name),
            ..b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::BoundaryService;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory service that counts fetches and yields once before
    /// answering, so concurrent callers overlap with the in-flight fetch.
    struct CountingService {
        districts: BTreeMap<BoundaryCode, Vec<Boundary>>,
        state_calls: AtomicUsize,
        district_calls: AtomicUsize,
        block_calls: AtomicUsize,
        fail_districts: bool,
    }

    impl CountingService {
        fn new(districts: BTreeMap<BoundaryCode, Vec<Boundary>>) -> Self {
            Self {
                districts,
                state_calls: AtomicUsize::new(0),
                district_calls: AtomicUsize::new(0),
                block_calls: AtomicUsize::new(0),
                fail_districts: false,
            }
        }
    }

    impl BoundaryService for CountingService {
        fn fetch_states(&self) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
            self.state_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(Vec::new())
            })
        }

        fn fetch_districts(
            &self,
            state: BoundaryCode,
        ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
            self.district_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::task::yield_now().await;
                if self.fail_districts {
                    return Err(FetchError::Districts {
                        state,
                        detail: "boom".into(),
                    });
                }
                Ok(self.districts.get(&state).cloned().unwrap_or_default())
            })
        }

        fn fetch_blocks(
            &self,
            _district: BoundaryCode,
        ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
            self.block_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(Vec::new())
            })
        }
    }

    fn entry(code: &str, name: &str, active: bool) -> Boundary {
        Boundary {
            code: BoundaryCode::new(code),
            name: name.into(),
            active,
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let mut districts = BTreeMap::new();
        districts.insert(
            BoundaryCode::new("28"),
            vec![entry("118", "west godavari", true)],
        );
        let service = Arc::new(CountingService::new(districts));
        let cache = BoundaryCache::new(service.clone());

        let code = BoundaryCode::new("28");
        let (a, b, c) = tokio::join!(
            cache.districts(&code),
            cache.districts(&code),
            cache.districts(&code)
        );

        assert_eq!(service.district_calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(c.unwrap()[0].name, "West Godavari");

        // Warm hit afterwards, still one fetch.
        cache.districts(&code).await.unwrap();
        assert_eq!(service.district_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing_and_may_be_retried() {
        let mut service = CountingService::new(BTreeMap::new());
        service.fail_districts = true;
        let service = Arc::new(service);
        let cache = BoundaryCache::new(service.clone());

        let code = BoundaryCode::new("28");
        let err = cache.districts(&code).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Districts {
                state: code.clone(),
                detail: "boom".into()
            }
        );
        assert!(cache.cached_districts(&code).is_none());

        // A later call issues a fresh fetch instead of replaying the error.
        let _ = cache.districts(&code).await;
        assert_eq!(service.district_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn inactive_entries_resolve_but_are_not_selectable() {
        let mut districts = BTreeMap::new();
        districts.insert(
            BoundaryCode::new("28"),
            vec![
                entry("118", "west godavari", true),
                entry("119", "old merged district", false),
            ],
        );
        let cache = BoundaryCache::new(Arc::new(CountingService::new(districts)));

        let code = BoundaryCode::new("28");
        let all = cache.districts(&code).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].name, "Old Merged District");

        let selectable = cache.districts_for_selection(&code).await.unwrap();
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].code, BoundaryCode::new("118"));
    }

    #[tokio::test]
    async fn duplicate_normalized_names_stay_distinct_by_code() {
        let mut districts = BTreeMap::new();
        districts.insert(
            BoundaryCode::new("28"),
            vec![
                entry("118", "godavari", true),
                entry("119", "GODAVARI", true),
            ],
        );
        let cache = BoundaryCache::new(Arc::new(CountingService::new(districts)));

        let list = cache.districts(&BoundaryCode::new("28")).await.unwrap();
        assert_eq!(list[0].name, list[1].name);
        assert_ne!(list[0].code, list[1].code);
    }
}
