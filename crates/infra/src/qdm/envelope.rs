//! Response envelope and payload shapes of the QDM API
//!
//! Every endpoint answers `{ "meta": { "error", "status" }, "data": ... }`.
//! Failures carry `data.message`; bodies that are not an envelope at all are
//! reported verbatim.

use chrono::DateTime;
use qdmsync_domain::types::lenient::int_or_string;
use qdmsync_domain::{Credential, Page, PageCursor, QdmSyncError, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::InfraError;

/// Error variant a failed call is reported as.
pub(crate) type ErrorKind = fn(String) -> QdmSyncError;

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    error: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    fn message(&self) -> Option<String> {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    }
}

/// Read a response and decode its `data` payload.
pub(crate) async fn read_data<D>(response: Response, kind: ErrorKind) -> Result<D>
where
    D: DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await.map_err(InfraError::from)?;
    decode_data(status, &body, kind)
}

pub(crate) fn decode_data<D>(status: StatusCode, body: &str, kind: ErrorKind) -> Result<D>
where
    D: DeserializeOwned,
{
    let envelope = match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope,
        Err(_) if status != StatusCode::OK => return Err(kind(body.trim().to_string())),
        Err(err) => return Err(InfraError::from(err).into()),
    };

    if status != StatusCode::OK || envelope.meta.error {
        let message = envelope.message().unwrap_or_else(|| body.trim().to_string());
        return Err(kind(message));
    }

    serde_json::from_value(envelope.data).map_err(|e| InfraError::from(e).into())
}

/// `data` of `POST /token/authorize`
#[derive(Debug, Deserialize)]
pub(crate) struct AuthData {
    #[serde(default)]
    store_uid: String,
    access_token: String,
    #[serde(default)]
    token_type: String,
    /// Expiry as epoch seconds
    #[serde(deserialize_with = "int_or_string")]
    expires_in: i64,
    #[serde(default)]
    message: String,
}

impl AuthData {
    pub(crate) fn into_credential(self) -> Result<Credential> {
        let expires_at = DateTime::from_timestamp(self.expires_in, 0).ok_or_else(|| {
            QdmSyncError::Auth(format!("token expiry out of range: {}", self.expires_in))
        })?;
        Ok(Credential {
            token: self.access_token,
            token_type: self.token_type,
            expires_at,
            store_uid: self.store_uid,
            message: self.message,
        })
    }
}

/// `data` of the count endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct CountData {
    #[serde(deserialize_with = "int_or_string")]
    pub(crate) count: i64,
}

#[derive(Debug, Default, Deserialize)]
struct SearchCriteria {
    #[serde(default, deserialize_with = "int_or_string")]
    page_number: i64,
    #[serde(default, deserialize_with = "int_or_string")]
    page_count: i64,
}

/// `data` of a paged listing
#[derive(Debug, Deserialize)]
pub(crate) struct PageData<T> {
    #[serde(default, deserialize_with = "int_or_string")]
    total_count: i64,
    #[serde(default)]
    search_criteria: SearchCriteria,
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

impl<T> PageData<T> {
    /// Attach paging information, falling back to the cursor when the remote
    /// omits it.
    pub(crate) fn into_page(self, cursor: &PageCursor) -> Page<T> {
        let criteria = &self.search_criteria;
        let page_number = u32::try_from(criteria.page_number)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(cursor.page_number);

        let page_count = u32::try_from(criteria.page_count).ok().filter(|n| *n > 0).unwrap_or_else(|| {
            // Without a page count, derive it from the total, or keep walking
            // until an empty page.
            let total = u64::try_from(self.total_count).unwrap_or(0);
            if total == 0 {
                u32::MAX
            } else {
                u32::try_from(total.div_ceil(u64::from(cursor.page_size))).unwrap_or(u32::MAX)
            }
        });

        Page { records: self.result, page_number, page_count }
    }
}

/// `data` of `GET /customers/group`
#[derive(Debug, Deserialize)]
pub(crate) struct GroupData<T> {
    #[serde(default = "Vec::new")]
    pub(crate) result: Vec<T>,
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use qdmsync_domain::TimeWindow;

    use super::*;

    fn cursor(page_number: u32) -> PageCursor {
        let window = TimeWindow::new(
            Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let mut cursor = PageCursor::first(window, 10);
        for _ in 1..page_number {
            cursor.advance();
        }
        cursor
    }

    #[test]
    fn count_accepts_number_or_string() {
        let ok = r#"{"meta":{"error":false,"status":200},"data":{"count":"42"}}"#;
        let data: CountData = decode_data(StatusCode::OK, ok, QdmSyncError::RemoteApi).unwrap();
        assert_eq!(data.count, 42);

        let ok = r#"{"meta":{"error":false,"status":200},"data":{"count":7}}"#;
        let data: CountData = decode_data(StatusCode::OK, ok, QdmSyncError::RemoteApi).unwrap();
        assert_eq!(data.count, 7);
    }

    #[test]
    fn meta_error_surfaces_data_message() {
        let body = r#"{"meta":{"error":true,"status":401},"data":{"message":"Invalid token"}}"#;
        let err = decode_data::<CountData>(StatusCode::OK, body, QdmSyncError::RemoteApi)
            .unwrap_err();
        assert_eq!(err, QdmSyncError::RemoteApi("Invalid token".into()));
    }

    #[test]
    fn non_envelope_error_body_is_reported_raw() {
        let err = decode_data::<CountData>(
            StatusCode::BAD_GATEWAY,
            "upstream unavailable\n",
            QdmSyncError::Auth,
        )
        .unwrap_err();
        assert_eq!(err, QdmSyncError::Auth("upstream unavailable".into()));
    }

    #[test]
    fn malformed_success_body_is_a_remote_error() {
        let err =
            decode_data::<CountData>(StatusCode::OK, "<html>", QdmSyncError::Auth).unwrap_err();
        assert!(matches!(err, QdmSyncError::RemoteApi(_)));
    }

    #[test]
    fn auth_expiry_is_epoch_seconds() {
        let data: AuthData = serde_json::from_value(serde_json::json!({
            "store_uid": "s-1",
            "access_token": "jwt",
            "token_type": "Bearer",
            "expires_in": 1_700_000_000,
            "message": "ok"
        }))
        .unwrap();

        let credential = data.into_credential().unwrap();
        assert_eq!(credential.token, "jwt");
        assert_eq!(credential.expires_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn page_uses_search_criteria() {
        let data: PageData<i64> = serde_json::from_value(serde_json::json!({
            "count": 2,
            "total_count": 22,
            "search_criteria": {"page_size": 10, "page_number": 3, "page_count": 3},
            "result": [21, 22]
        }))
        .unwrap();

        let page = data.into_page(&cursor(3));
        assert_eq!(page.records, vec![21, 22]);
        assert_eq!((page.page_number, page.page_count), (3, 3));
        assert!(page.is_last());
    }

    #[test]
    fn page_count_falls_back_to_total() {
        let data: PageData<i64> =
            serde_json::from_value(serde_json::json!({"total_count": 25, "result": [1]})).unwrap();
        let page = data.into_page(&cursor(2));
        assert_eq!((page.page_number, page.page_count), (2, 3));
        assert!(!page.is_last());
    }
}
