use serde::Serialize;

/// Caller credentials forwarded verbatim to the upstream order service.
///
/// The relay never inspects or validates these values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Full `Authorization` header value, e.g. `Bearer abc`.
    #[serde(skip_serializing)]
    pub authorization: Option<String>,
    pub user_id: Option<String>,
    pub table_id: Option<String>,
}

impl AuthContext {
    pub fn new(
        authorization: Option<String>,
        user_id: Option<String>,
        table_id: Option<String>,
    ) -> Self {
        Self {
            authorization,
            user_id,
            table_id,
        }
    }
}
