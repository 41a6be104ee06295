//! reqwest-backed Toast API client
//!
//! The client authenticates once with machine client credentials and sends
//! every later request with the bearer token. Each attempt, retries
//! included, first acquires a permit from the shared [`RateLimiter`].

use super::api::ToastApi;
use super::models::{
    page_records, LoginRequest, LoginResponse, RestaurantDirectoryEntry,
    MACHINE_CLIENT_ACCESS_TYPE,
};
use crate::config::{secret_string, CredentialsConfig, RetryConfig, SecretString};
use crate::core::rate_limit::RateLimiter;
use crate::domain::{
    Category, ExtractionWindow, ExtractorError, RestaurantGuid, Result, ToastApiError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const LOGIN_PATH: &str = "authentication/v1/authentication/login";
const ORDERS_PATH: &str = "orders/v2/ordersBulk";
const RESTAURANTS_PATH: &str = "restaurants/v1/restaurants";
const DIRECTORY_PATH: &str = "partners/v1/restaurants";

/// Header selecting the restaurant a request applies to
pub const RESTAURANT_HEADER: &str = "Toast-Restaurant-External-ID";

/// Toast REST API client
///
/// # Example
///
/// ```no_run
/// use toast_extractor::adapters::toast::ToastClient;
/// use toast_extractor::config::load_config;
/// use toast_extractor::core::rate_limit::RateLimiter;
/// use std::sync::Arc;
///
/// # async fn example() -> toast_extractor::domain::Result<()> {
/// let config = load_config("toast.toml")?;
/// let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
/// let client = ToastClient::connect(&config.credentials, limiter).await?;
/// # Ok(())
/// # }
/// ```
pub struct ToastClient {
    http: Client,
    base_url: Url,
    access_token: SecretString,
    retry: RetryConfig,
    limiter: Arc<RateLimiter>,
}

impl ToastClient {
    /// Build the HTTP client and exchange the credentials for an access token
    ///
    /// # Errors
    ///
    /// Returns `ToastApiError::AuthenticationFailed` if the login is rejected,
    /// or a configuration error if the base URL is invalid.
    pub async fn connect(config: &CredentialsConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ExtractorError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        let base_url = parse_base_url(&config.base_url)?;

        let access_token =
            authenticate(&http, &base_url, config, &config.retry, &limiter).await?;

        tracing::info!(base_url = %base_url, "Authenticated with Toast API");

        Ok(Self {
            http,
            base_url,
            access_token,
            retry: config.retry.clone(),
            limiter,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            ExtractorError::Configuration(format!("Invalid request path '{path}': {e}"))
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token: &str = self.access_token.expose_secret().as_ref();
        request.bearer_auth(token)
    }

    /// Send a GET request and decode the JSON body
    async fn get_json(
        &self,
        url: &Url,
        query: &[(&str, String)],
        restaurant: Option<&RestaurantGuid>,
        describe: &str,
    ) -> Result<Value> {
        with_retry(&self.retry, &self.limiter, || async {
            let mut request = self.authorized(self.http.get(url.clone())).query(query);
            if let Some(restaurant) = restaurant {
                request = request.header(RESTAURANT_HEADER, restaurant.as_str());
            }

            let resp = request.send().await.map_err(transport_error)?;

            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let message = resp.text().await.unwrap_or_default();
                return Err(ExtractorError::Api(ToastApiError::RequestFailed {
                    request: describe.to_string(),
                    status,
                    message,
                }));
            }

            resp.json::<Value>().await.map_err(|e| {
                ExtractorError::Api(ToastApiError::InvalidResponse(format!("{describe}: {e}")))
            })
        })
        .await
    }

    async fn fetch_orders_page(
        &self,
        restaurant: &RestaurantGuid,
        window: &ExtractionWindow,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Value>> {
        let url = self.endpoint(ORDERS_PATH)?;
        let describe = format!("GET {ORDERS_PATH} restaurant={restaurant} page={page}");
        let query = [
            ("startDate", format_toast_date(window.start)),
            ("endDate", format_toast_date(window.end)),
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];

        let body = self
            .get_json(&url, &query, Some(restaurant), &describe)
            .await?;
        let records = page_records(body, &describe)?;

        tracing::debug!(
            restaurant = %restaurant,
            page,
            records = records.len(),
            "Fetched orders page"
        );
        Ok(records)
    }

    async fn fetch_configuration(&self, restaurant: &RestaurantGuid) -> Result<Vec<Value>> {
        let path = format!("{RESTAURANTS_PATH}/{restaurant}");
        let url = self.endpoint(&path)?;
        let describe = format!("GET {path}");

        let document = self
            .get_json(&url, &[], Some(restaurant), &describe)
            .await?;

        tracing::debug!(restaurant = %restaurant, "Fetched restaurant configuration");
        Ok(match document {
            Value::Null => Vec::new(),
            doc => vec![doc],
        })
    }
}

#[async_trait]
impl ToastApi for ToastClient {
    async fn fetch_page(
        &self,
        category: Category,
        restaurant: &RestaurantGuid,
        window: &ExtractionWindow,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Value>> {
        if category.is_single_document() {
            if page > 1 {
                return Ok(Vec::new());
            }
            return self.fetch_configuration(restaurant).await;
        }
        self.fetch_orders_page(restaurant, window, page, page_size)
            .await
    }

    async fn list_restaurants(&self) -> Result<Vec<RestaurantDirectoryEntry>> {
        let url = self.endpoint(DIRECTORY_PATH)?;
        let describe = format!("GET {DIRECTORY_PATH}");

        let body = self.get_json(&url, &[], None, &describe).await?;
        let entries: Vec<RestaurantDirectoryEntry> =
            serde_json::from_value(body).map_err(|e| {
                ExtractorError::Api(ToastApiError::InvalidResponse(format!("{describe}: {e}")))
            })?;

        tracing::info!(restaurants = entries.len(), "Fetched restaurant directory");
        Ok(entries)
    }

    fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}

/// Exchange the machine client credentials for an access token
async fn authenticate(
    http: &Client,
    base_url: &Url,
    config: &CredentialsConfig,
    retry: &RetryConfig,
    limiter: &RateLimiter,
) -> Result<SecretString> {
    let url = base_url.join(LOGIN_PATH).map_err(|e| {
        ExtractorError::Configuration(format!("Invalid base URL '{base_url}': {e}"))
    })?;

    let token = with_retry(retry, limiter, || async {
        let body = LoginRequest {
            client_id: config.client_id.trim(),
            client_secret: config.client_secret.expose_secret().as_ref(),
            user_access_type: MACHINE_CLIENT_ACCESS_TYPE,
        };

        let resp = http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractorError::Api(ToastApiError::AuthenticationFailed(
                format!("Received {status}: {body}"),
            )));
        }

        let login: LoginResponse = resp.json().await.map_err(|e| {
            ExtractorError::Api(ToastApiError::AuthenticationFailed(format!(
                "Unexpected login response: {e}"
            )))
        })?;
        Ok(login.token.access_token)
    })
    .await?;

    Ok(secret_string(token))
}

/// Retry an operation on transport failures with exponential backoff
///
/// Every attempt acquires a rate limiter permit first. Server responses,
/// successful or not, are returned as they are.
async fn with_retry<T, F, Fut>(retry: &RetryConfig, limiter: &RateLimiter, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = retry.max_retries;
    let mut attempt = 0;

    loop {
        limiter.acquire().await;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(ExtractorError::Api(e)) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay_ms = backoff_delay_ms(retry, attempt);

                tracing::warn!(
                    attempt = attempt,
                    max_retries = max_retries,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying request after error"
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (1-based)
fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
    let delay = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    delay.min(retry.max_delay_ms as f64) as u64
}

fn transport_error(e: reqwest::Error) -> ExtractorError {
    if e.is_timeout() {
        ExtractorError::Api(ToastApiError::Timeout(e.to_string()))
    } else {
        ExtractorError::Api(ToastApiError::ConnectionFailed(e.to_string()))
    }
}

/// Parse the configured base URL so relative paths join below it
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = format!("{}/", raw.trim().trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| ExtractorError::Configuration(format!("Invalid base_url '{raw}': {e}")))
}

/// Timestamp format expected by the orders endpoint
pub fn format_toast_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3f+0000").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;

    fn credentials(base_url: &str) -> CredentialsConfig {
        CredentialsConfig {
            base_url: base_url.to_string(),
            client_id: "client-id".to_string(),
            client_secret: secret_string("client-secret".to_string()),
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
        }
    }

    fn window() -> ExtractionWindow {
        ExtractionWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    async fn login_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/authentication/v1/authentication/login")
            .match_body(Matcher::Json(json!({
                "clientId": "client-id",
                "clientSecret": "client-secret",
                "userAccessType": "TOAST_MACHINE_CLIENT"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token": {"accessToken": "token-123", "tokenType": "Bearer"}}"#)
            .create_async()
            .await
    }

    async fn connect(server: &mockito::ServerGuard) -> ToastClient {
        ToastClient::connect(&credentials(&server.url()), Arc::new(RateLimiter::default()))
            .await
            .unwrap()
    }

    #[test]
    fn test_format_toast_date() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap();
        assert_eq!(format_toast_date(ts), "2024-05-01T13:04:05.000+0000");
    }

    #[test]
    fn test_parse_base_url_keeps_path_prefix() {
        let url = parse_base_url("https://example.com/toast").unwrap();
        assert_eq!(
            url.join(ORDERS_PATH).unwrap().as_str(),
            "https://example.com/toast/orders/v2/ordersBulk"
        );
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 500,
            backoff_multiplier: 2.0,
        };
        assert_eq!(backoff_delay_ms(&retry, 1), 100);
        assert_eq!(backoff_delay_ms(&retry, 2), 200);
        assert_eq!(backoff_delay_ms(&retry, 3), 400);
        assert_eq!(backoff_delay_ms(&retry, 4), 500);
    }

    #[tokio::test]
    async fn test_login_rejected_is_authentication_failure() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/authentication/v1/authentication/login")
            .with_status(401)
            .with_body(r#"{"message": "invalid client"}"#)
            .create_async()
            .await;

        let err = ToastClient::connect(
            &credentials(&server.url()),
            Arc::new(RateLimiter::default()),
        )
        .await
        .err()
        .unwrap();

        assert!(err.is_authentication());
        assert!(err.to_string().contains("invalid client"));
    }

    #[tokio::test]
    async fn test_orders_page_request() {
        let mut server = mockito::Server::new_async().await;
        let login = login_mock(&mut server).await;
        let orders = server
            .mock("GET", "/orders/v2/ordersBulk")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("startDate".into(), "2024-05-01T00:00:00.000+0000".into()),
                Matcher::UrlEncoded("endDate".into(), "2024-05-02T00:00:00.000+0000".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("pageSize".into(), "50".into()),
            ]))
            .match_header(RESTAURANT_HEADER, "rest-1")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"guid": "o-1"}, {"guid": "o-2"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = connect(&server).await;
        let restaurant = RestaurantGuid::new("rest-1").unwrap();
        let records = client
            .fetch_page(Category::Orders, &restaurant, &window(), 2, 50)
            .await
            .unwrap();

        assert_eq!(records, vec![json!({"guid": "o-1"}), json!({"guid": "o-2"})]);
        login.assert_async().await;
        orders.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_names_request_and_message() {
        let mut server = mockito::Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let failing = server
            .mock("GET", "/orders/v2/ordersBulk")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("startDate must be before endDate")
            .expect(1)
            .create_async()
            .await;

        let client = connect(&server).await;
        let restaurant = RestaurantGuid::new("rest-1").unwrap();
        let err = client
            .fetch_page(Category::Orders, &restaurant, &window(), 1, 100)
            .await
            .unwrap_err();

        match err {
            ExtractorError::Api(ToastApiError::RequestFailed {
                request,
                status,
                message,
            }) => {
                assert!(request.contains("orders/v2/ordersBulk"));
                assert!(request.contains("page=1"));
                assert_eq!(status, 400);
                assert_eq!(message, "startDate must be before endDate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_configuration_is_single_document() {
        let mut server = mockito::Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let config = server
            .mock("GET", "/restaurants/v1/restaurants/rest-1")
            .match_header(RESTAURANT_HEADER, "rest-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"guid": "rest-1", "general": {"name": "Downtown"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = connect(&server).await;
        let restaurant = RestaurantGuid::new("rest-1").unwrap();

        let first = client
            .fetch_page(Category::Configuration, &restaurant, &window(), 1, 100)
            .await
            .unwrap();
        let second = client
            .fetch_page(Category::Configuration, &restaurant, &window(), 2, 100)
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["general"]["name"], "Downtown");
        assert!(second.is_empty());
        config.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_restaurants() {
        let mut server = mockito::Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let _directory = server
            .mock("GET", "/partners/v1/restaurants")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"restaurantGuid": "r-1", "managementGroupGuid": "g-1", "restaurantName": "A"},
                    {"restaurantGuid": "r-2", "managementGroupGuid": "g-2"}
                ]"#,
            )
            .create_async()
            .await;

        let client = connect(&server).await;
        let entries = client.list_restaurants().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].restaurant_guid, "r-1");
        assert_eq!(entries[1].restaurant_name, None);
    }
}
