use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A backend collection reachable at `/{PATH}` under the API root.
///
/// The concrete type is the record shape returned by `GET /{PATH}/{id}`.
/// List endpoints wrap records in [`ListResponse`].
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path segment, e.g. `"courses"`.
    const PATH: &'static str;
}

/// Server list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
