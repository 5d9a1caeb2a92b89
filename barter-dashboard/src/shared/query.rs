/// Request layer for table queries and stats pulls
///
/// [`RecordQuery`] and [`StatsSource`] are the seams a [`DashboardSession`](crate::DashboardSession)
/// talks to; [`HttpDashboardApi`] implements both against the dashboard REST backend.
use crate::shared::{
    config::DashboardConfig,
    error::DashboardError,
    pagination::{PageRequest, QueryPage},
    types::{SignalRecord, StatsSnapshot, TradeRecord},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const SIGNAL_DETAILS_PATH: &str = "get_signal_details";
pub const TRADE_DETAILS_PATH: &str = "get_trade_details";
pub const STATS_PATH: &str = "broadcastTradeDetails";

/// Paginated, filtered query for one record type.
#[async_trait]
pub trait RecordQuery<R>: Send + Sync {
    async fn query(&self, request: &PageRequest) -> Result<QueryPage<R>, DashboardError>;
}

/// One-shot pull of the current [`StatsSnapshot`].
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, DashboardError>;
}

/// Response body of the paginated endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse<R> {
    #[serde(default = "Vec::new")]
    pub data: Vec<R>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: u32,
    /// Not reported by every endpoint; missing reads as 0
    #[serde(default)]
    pub total_records: u64,
}

impl<R> From<QueryResponse<R>> for QueryPage<R> {
    fn from(response: QueryResponse<R>) -> Self {
        Self {
            records: response.data,
            total_pages: response.pagination.total_pages,
            total_records: response.pagination.total_records,
        }
    }
}

/// REST client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpDashboardApi {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        Self::with_client(reqwest::Client::new(), &config.api_url, config.request_timeout)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DashboardError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::InvalidUrl(base_url.to_string()));
        }

        // Url::join replaces the last path segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, DashboardError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T, Q>(&self, path: &str, params: Option<&Q>) -> Result<T, DashboardError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(DashboardError::Status {
                endpoint: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_page<R>(
        &self,
        path: &str,
        request: &PageRequest,
    ) -> Result<QueryPage<R>, DashboardError>
    where
        R: DeserializeOwned,
    {
        debug!(
            path,
            token = request.token.0,
            page = request.page,
            limit = request.limit,
            "querying page"
        );

        let response: QueryResponse<R> = self.get_json(path, Some(&request.params())).await?;
        Ok(QueryPage::from(response))
    }
}

#[async_trait]
impl RecordQuery<SignalRecord> for HttpDashboardApi {
    async fn query(&self, request: &PageRequest) -> Result<QueryPage<SignalRecord>, DashboardError> {
        self.fetch_page(SIGNAL_DETAILS_PATH, request).await
    }
}

#[async_trait]
impl RecordQuery<TradeRecord> for HttpDashboardApi {
    async fn query(&self, request: &PageRequest) -> Result<QueryPage<TradeRecord>, DashboardError> {
        self.fetch_page(TRADE_DETAILS_PATH, request).await
    }
}

#[async_trait]
impl StatsSource for HttpDashboardApi {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, DashboardError> {
        debug!(path = STATS_PATH, "pulling stats snapshot");
        self.get_json::<StatsSnapshot, ()>(STATS_PATH, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        struct TestCase {
            base: &'static str,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: bare host
                base: "http://127.0.0.1:5000",
                expected: "http://127.0.0.1:5000/get_signal_details",
            },
            TestCase {
                // TC1: path prefix w/o trailing slash
                base: "https://dashboard.example.com/api",
                expected: "https://dashboard.example.com/api/get_signal_details",
            },
            TestCase {
                // TC2: path prefix w/ trailing slash
                base: "https://dashboard.example.com/api/",
                expected: "https://dashboard.example.com/api/get_signal_details",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let api = HttpDashboardApi::with_client(
                reqwest::Client::new(),
                test.base,
                Duration::from_secs(10),
            )
            .unwrap();

            let actual = api.endpoint(SIGNAL_DETAILS_PATH).unwrap();
            assert_eq!(actual.as_str(), test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpDashboardApi::with_client(
            reqwest::Client::new(),
            "not a url",
            Duration::from_secs(10),
        );
        assert!(matches!(result, Err(DashboardError::InvalidUrl(_))));

        let result = HttpDashboardApi::with_client(
            reqwest::Client::new(),
            "mailto:ops@example.com",
            Duration::from_secs(10),
        );
        assert!(matches!(result, Err(DashboardError::InvalidUrl(_))));
    }

    #[test]
    fn test_de_query_response() {
        let input = r#"
        {
            "data": [
                {
                    "_id": "s-1",
                    "direction": "BUY",
                    "signal": "BUY",
                    "signalTime": "2024-03-01T12:30:00Z",
                    "price": 42000.5,
                    "strength": "medium"
                }
            ],
            "pagination": { "totalPages": 4, "totalRecords": 37, "currentPage": 1 }
        }
        "#;

        let page = QueryPage::from(serde_json::from_str::<QueryResponse<SignalRecord>>(input).unwrap());

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "s-1");
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.total_records, 37);
    }

    #[test]
    fn test_de_query_response_missing_total_records() {
        let input = r#"{ "data": [], "pagination": { "totalPages": 2, "currentPage": 1 } }"#;

        let page = QueryPage::from(serde_json::from_str::<QueryResponse<TradeRecord>>(input).unwrap());

        assert!(page.records.is_empty());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_records, 0);
    }

    #[test]
    fn test_query_params_encoding() {
        use crate::shared::{
            pagination::{FilterSet, RequestToken},
            types::Direction,
        };

        let request = PageRequest {
            token: RequestToken(1),
            filters: FilterSet {
                direction: Some(Direction::Sell),
                start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 5),
                end_date: None,
            },
            page: 3,
            limit: 10,
        };

        let url = reqwest::Client::new()
            .get("http://127.0.0.1:5000/get_signal_details")
            .query(&request.params())
            .build()
            .unwrap()
            .url()
            .clone();

        assert_eq!(
            url.query(),
            Some("startDate=2024-01-05&endDate=&strength=&price=0&page=3&limit=10&direction=SELL")
        );
    }
}
