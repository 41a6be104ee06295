//! Toast API models
//!
//! Request and response bodies of the Toast REST API. Records themselves stay
//! as `serde_json::Value`; only the envelopes are typed here.

use crate::domain::{ExtractorError, ManagementGroupGuid, Result, ToastApiError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access type sent with machine client credentials
pub const MACHINE_CLIENT_ACCESS_TYPE: &str = "TOAST_MACHINE_CLIENT";

/// Body of `POST authentication/v1/authentication/login`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub user_access_type: &'a str,
}

/// Response of the login call; only the access token is used
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: LoginToken,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginToken {
    pub access_token: String,
}

/// One entry of `GET partners/v1/restaurants`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDirectoryEntry {
    pub restaurant_guid: String,
    #[serde(default)]
    pub management_group_guid: Option<String>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
}

impl RestaurantDirectoryEntry {
    /// Whether the restaurant belongs to one of `groups`
    pub fn in_any_group(&self, groups: &[ManagementGroupGuid]) -> bool {
        self.management_group_guid
            .as_deref()
            .map(str::trim)
            .is_some_and(|guid| groups.iter().any(|g| g.as_str() == guid))
    }
}

/// Listing page body: a bare array or an object wrapping it under `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageBody {
    Records(Vec<Value>),
    Wrapped {
        #[serde(default)]
        data: Vec<Value>,
    },
}

/// Extract the records of one listing page
///
/// # Errors
///
/// Returns `ToastApiError::InvalidResponse` when the body is neither shape.
pub fn page_records(body: Value, request: &str) -> Result<Vec<Value>> {
    match serde_json::from_value::<PageBody>(body) {
        Ok(PageBody::Records(records)) | Ok(PageBody::Wrapped { data: records }) => Ok(records),
        Err(e) => Err(ExtractorError::Api(ToastApiError::InvalidResponse(format!(
            "{request}: expected an array of records: {e}"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_records_accepts_both_shapes() {
        let bare = page_records(json!([{"guid": "a"}, {"guid": "b"}]), "GET x").unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = page_records(json!({"data": [{"guid": "a"}]}), "GET x").unwrap();
        assert_eq!(wrapped, vec![json!({"guid": "a"})]);

        assert!(page_records(json!({}), "GET x").unwrap().is_empty());
    }

    #[test]
    fn test_page_records_rejects_scalars() {
        let err = page_records(json!("oops"), "GET orders/v2/ordersBulk").unwrap_err();
        assert!(err.to_string().contains("orders/v2/ordersBulk"));
    }

    #[test]
    fn test_login_request_uses_camel_case() {
        let body = serde_json::to_value(LoginRequest {
            client_id: "id",
            client_secret: "secret",
            user_access_type: MACHINE_CLIENT_ACCESS_TYPE,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"clientId": "id", "clientSecret": "secret", "userAccessType": "TOAST_MACHINE_CLIENT"})
        );
    }

    #[test]
    fn test_directory_group_filter() {
        let entry: RestaurantDirectoryEntry = serde_json::from_value(json!({
            "restaurantGuid": "r-1",
            "managementGroupGuid": "g-1",
            "restaurantName": "Downtown"
        }))
        .unwrap();

        let groups = vec![ManagementGroupGuid::new("g-1").unwrap()];
        assert!(entry.in_any_group(&groups));
        assert!(!entry.in_any_group(&[ManagementGroupGuid::new("g-2").unwrap()]));
    }
}
