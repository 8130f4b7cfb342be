//! Boundary lookup service client.
//!
//! The dashboard resolves administrative-region codes against three
//! unauthenticated endpoints (`/get_states/`, `/get_districts/{code}/`,
//! `/get_blocks/{code}/`). The service sits behind the `BoundaryService`
//! trait so the cache and resolver can be exercised against in-memory
//! implementations.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Administrative-region identifier (state/district/block), scoped to its
/// parent region: a district code is only unique within its state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundaryCode(String);

impl BoundaryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoundaryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoundaryCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<i64> for BoundaryCode {
    fn from(code: i64) -> Self {
        Self(code.to_string())
    }
}

/// One entry of a fetched region list. A structured pair of stable key
/// and display label, so selection widgets never split composite strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub code: BoundaryCode,
    pub name: String,
    pub active: bool,
}

/// Fetch failure for one cache tier, carrying the parent code so the
/// diagnostic names what could not be resolved.
///
/// Clone-able: coalesced waiters of a single underlying fetch all
/// observe the same error value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    States { detail: String },
    Districts { state: BoundaryCode, detail: String },
    Blocks { district: BoundaryCode, detail: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::States { detail } => write!(f, "state list fetch failed: {detail}"),
            FetchError::Districts { state, detail } => {
                write!(f, "district fetch failed for state {state}: {detail}")
            }
            FetchError::Blocks { district, detail } => {
                write!(f, "block fetch failed for district {district}: {detail}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Trait for boundary list providers.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait BoundaryService: Send + Sync {
    fn fetch_states(&self) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>>;

    fn fetch_districts(
        &self,
        state: BoundaryCode,
    ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>>;

    fn fetch_blocks(
        &self,
        district: BoundaryCode,
    ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>>;
}

/// HTTP implementation over the dashboard's boundary lookup endpoints.
pub struct HttpBoundaryService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBoundaryService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP error: {}", resp.status()));
        }

        resp.json::<T>()
            .await
            .map_err(|e| format!("bad payload: {e}"))
    }
}

impl BoundaryService for HttpBoundaryService {
    fn fetch_states(&self) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
        Box::pin(async move {
            let payload: StatesPayload = self
                .get_json("get_states/")
                .await
                .map_err(|detail| FetchError::States { detail })?;
            Ok(payload
                .states
                .into_iter()
                .map(|r| Boundary {
                    code: r.state_census_code.into_code(),
                    name: r.state_name,
                    active: r.active_status,
                })
                .collect())
        })
    }

    fn fetch_districts(
        &self,
        state: BoundaryCode,
    ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
        Box::pin(async move {
            let payload: DistrictsPayload = self
                .get_json(&format!("get_districts/{state}/"))
                .await
                .map_err(|detail| FetchError::Districts {
                    state: state.clone(),
                    detail,
                })?;
            Ok(payload
                .districts
                .into_iter()
                .map(|r| Boundary {
                    code: r.id.into_code(),
                    name: r.district_name,
                    active: r.active_status,
                })
                .collect())
        })
    }

    fn fetch_blocks(
        &self,
        district: BoundaryCode,
    ) -> BoxFuture<'_, Result<Vec<Boundary>, FetchError>> {
        Box::pin(async move {
            let payload: BlocksPayload = self
                .get_json(&format!("get_blocks/{district}/"))
                .await
                .map_err(|detail| FetchError::Blocks {
                    district: district.clone(),
                    detail,
                })?;
            Ok(payload
                .blocks
                .into_iter()
                .map(|r| Boundary {
                    code: r.id.into_code(),
                    name: r.block_name,
                    active: r.active_status,
                })
                .collect())
        })
    }
}

// Wire payloads. Arrays may be absent entirely (treated as empty), codes
// arrive as JSON numbers or strings, and `active_status` defaults to true.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CodeValue {
    Number(i64),
    Text(String),
}

impl CodeValue {
    fn into_code(self) -> BoundaryCode {
        match self {
            CodeValue::Number(n) => BoundaryCode::new(n.to_string()),
            CodeValue::Text(s) => BoundaryCode::new(s),
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct StatesPayload {
    #[serde(default)]
    states: Vec<StateRecord>,
}

#[derive(Debug, Deserialize)]
struct StateRecord {
    state_census_code: CodeValue,
    #[serde(default)]
    state_name: String,
    #[serde(default = "default_active")]
    active_status: bool,
}

#[derive(Debug, Deserialize)]
struct DistrictsPayload {
    #[serde(default)]
    districts: Vec<DistrictRecord>,
}

#[derive(Debug, Deserialize)]
struct DistrictRecord {
    id: CodeValue,
    #[serde(default)]
    district_name: String,
    #[serde(default = "default_active")]
    active_status: bool,
}

#[derive(Debug, Deserialize)]
struct BlocksPayload {
    #[serde(default)]
    blocks: Vec<BlockRecord>,
}

#[derive(Debug, Deserialize)]
struct BlockRecord {
    id: CodeValue,
    #[serde(default)]
    block_name: String,
    #[serde(default = "default_active")]
    active_status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_states_with_numeric_and_text_codes() {
        let payload: StatesPayload = serde_json::from_str(
            r#"{"states":[
                {"state_census_code":28,"state_name":"andhra pradesh","active_status":true},
                {"state_census_code":"09","state_name":"uttar pradesh","active_status":false}
            ]}"#,
        )
        .unwrap();

        let states: Vec<Boundary> = payload
            .states
            .into_iter()
            .map(|r| Boundary {
                code: r.state_census_code.into_code(),
                name: r.state_name,
                active: r.active_status,
            })
            .collect();

        assert_eq!(states[0].code, BoundaryCode::new("28"));
        assert_eq!(states[1].code, BoundaryCode::new("09"));
        assert!(!states[1].active);
    }

    #[test]
    fn tolerates_absent_arrays_and_flags() {
        let payload: DistrictsPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.districts.is_empty());

        let payload: BlocksPayload =
            serde_json::from_str(r#"{"blocks":[{"id":2207,"block_name":"palakonda"}]}"#).unwrap();
        assert!(payload.blocks[0].active_status);
    }
}
