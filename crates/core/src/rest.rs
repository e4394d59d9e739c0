//! REST-backed collaborators.
//!
//! `RestClient` talks to the OpenMRS reporting REST resources and the optional NMRS category
//! extension. Response bodies are translated by the `openmrs` crate; this module only moves
//! bytes and maps HTTP status to [`ReportError`].

use crate::config::ClientConfig;
use crate::constants::{
    LOCATIONS_PATH, NMRS_CATEGORIES_PATH, NMRS_CATEGORY_PATH, NMRS_METADATA_PATH,
    REPORT_DEFINITIONS_PATH, REPORT_DESIGNS_PATH, RUN_REPORT_PATH,
};
use crate::providers::{CategoryProvider, ReportCatalogue, RunReportTransport};
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use openmrs::{
    Categories, CategoryKey, CategorySet, Location, Locations, NmrsMetadata, RenderDesign,
    RenderDesigns, ReportDefinition, ReportDefinitions, ReportsByCategory, RunReport,
    RunReportRequest,
};
use reqwest::StatusCode;

#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RestClient {
    /// # Errors
    ///
    /// Returns [`ReportError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> ReportResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.config.base_url(), path_and_query)
    }

    fn designs_url(&self, report_uuid: &str) -> String {
        self.url(&format!(
            "{REPORT_DESIGNS_PATH}?reportDefinitionUuid={}",
            urlencoding::encode(report_uuid)
        ))
    }

    fn category_url(&self, key: &CategoryKey) -> String {
        self.url(&format!(
            "{NMRS_CATEGORY_PATH}?type={}",
            urlencoding::encode(key.as_str())
        ))
    }

    fn authorise(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.username() {
            Some(username) => request.basic_auth(username, self.config.password()),
            None => request,
        }
    }

    async fn get(&self, url: &str) -> ReportResult<(StatusCode, String)> {
        tracing::debug!(url, "GET");
        let response = self
            .authorise(self.http.get(url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        Ok((status, response.text().await?))
    }

    async fn get_required(&self, url: &str) -> ReportResult<String> {
        let (status, body) = self.get(url).await?;
        check_status(status, &body)?;
        Ok(body)
    }

    /// GET a resource of an optional module; `None` when the module is not installed.
    async fn get_optional(&self, url: &str) -> ReportResult<Option<String>> {
        let (status, body) = self.get(url).await?;
        optional_body(status, body)
    }
}

/// Map a non-2xx response to [`ReportError::Rejected`], keeping the server's message.
fn check_status(status: StatusCode, body: &str) -> ReportResult<()> {
    if status.is_success() {
        return Ok(());
    }

    Err(ReportError::Rejected {
        status: status.as_u16(),
        message: RunReport::parse_error_message(body),
    })
}

/// A 404 from an optional module's resource means the module is absent.
fn optional_body(status: StatusCode, body: String) -> ReportResult<Option<String>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    check_status(status, &body)?;
    Ok(Some(body))
}

#[async_trait]
impl ReportCatalogue for RestClient {
    async fn fetch_report_definitions(&self) -> ReportResult<Vec<ReportDefinition>> {
        let body = self.get_required(&self.url(REPORT_DEFINITIONS_PATH)).await?;
        Ok(ReportDefinitions::parse(&body)?)
    }

    async fn fetch_report_designs(&self, report_uuid: &str) -> ReportResult<Vec<RenderDesign>> {
        let body = self.get_required(&self.designs_url(report_uuid)).await?;
        Ok(RenderDesigns::parse(&body)?)
    }

    async fn fetch_locations(&self) -> ReportResult<Vec<Location>> {
        let body = self.get_required(&self.url(LOCATIONS_PATH)).await?;
        Ok(Locations::parse(&body)?)
    }
}

#[async_trait]
impl CategoryProvider for RestClient {
    async fn fetch_categories(&self) -> ReportResult<Option<CategorySet>> {
        match self.get_optional(&self.url(NMRS_CATEGORIES_PATH)).await? {
            Some(body) => Ok(Categories::parse(&body)?),
            None => {
                tracing::info!("report category module not installed");
                Ok(None)
            }
        }
    }

    async fn fetch_reports_by_category(
        &self,
        key: &CategoryKey,
    ) -> ReportResult<ReportsByCategory> {
        let body = self.get_required(&self.category_url(key)).await?;
        Ok(Categories::parse_reports_by_category(&body)?)
    }

    async fn fetch_metadata(&self) -> ReportResult<Option<NmrsMetadata>> {
        match self.get_optional(&self.url(NMRS_METADATA_PATH)).await? {
            Some(body) => Ok(Some(Categories::parse_metadata(&body)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RunReportTransport for RestClient {
    async fn submit_run_report(&self, request: &RunReportRequest) -> ReportResult<()> {
        let body = RunReport::to_json(request)?;
        let url = self.url(RUN_REPORT_PATH);
        tracing::debug!(url = %url, report = %request.report_uuid, "POST run report");

        let response = self
            .authorise(self.http.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        check_status(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> RestClient {
        let config = ClientConfig::new(base_url, None, None).expect("client config");
        RestClient::new(config).expect("rest client")
    }

    #[test]
    fn builds_resource_urls_against_base() {
        let client = client("https://emr.example.org/openmrs/");

        assert_eq!(
            client.url(REPORT_DEFINITIONS_PATH),
            "https://emr.example.org/openmrs/ws/rest/v1/reportingrest/reportDefinition?v=full"
        );
        assert_eq!(
            client.designs_url("R1"),
            "https://emr.example.org/openmrs/ws/rest/v1/reportingrest/designs?reportDefinitionUuid=R1"
        );
    }

    #[test]
    fn query_values_are_encoded() {
        let client = client("http://localhost:8080/openmrs");

        assert_eq!(
            client.designs_url("a b&c"),
            "http://localhost:8080/openmrs/ws/rest/v1/reportingrest/designs?reportDefinitionUuid=a%20b%26c"
        );
        assert_eq!(
            client.category_url(&CategoryKey::data_quality()),
            "http://localhost:8080/openmrs/ws/rest/v1/nmrsreports/category?type=dataQuality"
        );
    }

    #[test]
    fn success_status_passes() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert!(check_status(StatusCode::CREATED, "{}").is_ok());
    }

    #[test]
    fn rejection_carries_server_message() {
        let body = r#"{"error":{"message":"Invalid date range","code":"webservices.rest"}}"#;
        let err = check_status(StatusCode::BAD_REQUEST, body).expect_err("rejected");

        match &err {
            ReportError::Rejected { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message.as_deref(), Some("Invalid date range"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message().as_deref(), Some("Invalid date range"));
    }

    #[test]
    fn missing_optional_module_reads_as_absent() {
        let body = r#"{"error":{"message":"Unknown resource: nmrsreports"}}"#;
        assert_eq!(
            optional_body(StatusCode::NOT_FOUND, body.to_string()).expect("absent"),
            None
        );
        assert_eq!(
            optional_body(StatusCode::OK, "{}".to_string()).expect("present"),
            Some("{}".to_string())
        );

        let err = optional_body(StatusCode::FORBIDDEN, String::new()).expect_err("rejected");
        assert!(matches!(err, ReportError::Rejected { status: 403, .. }));
    }

    #[test]
    fn required_resource_404_is_a_rejection() {
        let err = check_status(StatusCode::NOT_FOUND, "").expect_err("rejected");
        assert!(matches!(err, ReportError::Rejected { status: 404, .. }));
    }

    #[test]
    fn rejection_without_error_body_has_no_message() {
        let err = check_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>")
            .expect_err("rejected");

        assert!(matches!(
            err,
            ReportError::Rejected {
                status: 500,
                message: None
            }
        ));
        assert_eq!(err.user_message(), None);
    }
}
