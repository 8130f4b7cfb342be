//! Name resolution for boundary codes found in arbitrary datasets.
//!
//! Pages hand the resolver a batch of records (a plan listing, an export)
//! referencing many distinct state/district codes. `prime_for_dataset`
//! warms the cache with one fetch per distinct code, after which
//! `resolve_names` is a synchronous lookup per record.

use std::collections::BTreeSet;

use futures_util::FutureExt;
use futures_util::future::join_all;

use crate::cache::BoundaryCache;
use crate::service::{Boundary, BoundaryCode, BoxFuture};

pub const UNKNOWN_STATE: &str = "Unknown State";
pub const UNKNOWN_DISTRICT: &str = "Unknown District";
pub const UNKNOWN_BLOCK: &str = "Unknown Block";

/// Display names for one (state, district, block) code triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub state: String,
    pub district: String,
    pub block: String,
}

/// The boundary codes one dataset record references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DatasetRef {
    pub state: BoundaryCode,
    pub district: BoundaryCode,
}

impl DatasetRef {
    pub fn new(state: impl Into<BoundaryCode>, district: impl Into<BoundaryCode>) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
        }
    }
}

#[derive(Clone)]
pub struct BoundaryResolver {
    cache: BoundaryCache,
}

impl BoundaryResolver {
    pub fn new(cache: BoundaryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &BoundaryCache {
        &self.cache
    }

    /// Synchronous lookup against the warmed cache. Each level that
    /// cannot be resolved (cold tier, unknown code) degrades to its
    /// literal `Unknown *` fallback instead of blocking the page.
    pub fn resolve_names(
        &self,
        state: &BoundaryCode,
        district: &BoundaryCode,
        block: &BoundaryCode,
    ) -> ResolvedNames {
        let state_name = self
            .cache
            .cached_states()
            .and_then(|list| name_of(&list, state))
            .unwrap_or_else(|| UNKNOWN_STATE.to_string());
        let district_name = self
            .cache
            .cached_districts(state)
            .and_then(|list| name_of(&list, district))
            .unwrap_or_else(|| UNKNOWN_DISTRICT.to_string());
        let block_name = self
            .cache
            .cached_blocks(district)
            .and_then(|list| name_of(&list, block))
            .unwrap_or_else(|| UNKNOWN_BLOCK.to_string());

        ResolvedNames {
            state: state_name,
            district: district_name,
            block: block_name,
        }
    }

    /// Warms the cache for a whole batch: the state list, districts for
    /// each distinct state, blocks for each distinct district. One fetch
    /// per distinct code, not one per record; fetches run concurrently
    /// and this resolves only after all of them settle, so subsequent
    /// `resolve_names` calls over the batch are warm.
    ///
    /// Fetch failures are logged and swallowed; resolution over the
    /// affected codes degrades to the `Unknown *` fallbacks.
    pub async fn prime_for_dataset<I>(&self, refs: I)
    where
        I: IntoIterator<Item = DatasetRef>,
    {
        let mut states: BTreeSet<BoundaryCode> = BTreeSet::new();
        let mut districts: BTreeSet<BoundaryCode> = BTreeSet::new();
        for r in refs {
            states.insert(r.state);
            districts.insert(r.district);
        }

        let mut fetches: Vec<BoxFuture<'_, ()>> = Vec::new();
        fetches.push(
            async {
                if let Err(e) = self.cache.states().await {
                    tracing::warn!("priming: {e}");
                }
            }
            .boxed(),
        );
        for code in &states {
            fetches.push(
                async move {
                    if let Err(e) = self.cache.districts(code).await {
                        tracing::warn!("priming: {e}");
                    }
                }
                .boxed(),
            );
        }
        for code in &districts {
            fetches.push(
                async move {
                    if let Err(e) = self.cache.blocks(code).await {
                        tracing::warn!("priming: {e}");
                    }
                }
                .boxed(),
            );
        }

        join_all(fetches).await;
    }
}

fn name_of(list: &[Boundary], code: &BoundaryCode) -> Option<String> {
    list.iter().find(|b| &b.code == code).map(|b| b.name.clone())
}
