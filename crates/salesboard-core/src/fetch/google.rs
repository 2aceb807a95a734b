use std::time::Duration;

use async_trait::async_trait;
use salesboard_sheets::RawWorksheet;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::credentials::TokenProvider;
use super::{body_text, FetchError, WorksheetSource};

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    range: String,
    // Omitted by the API when the worksheet has no values at all.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Read-only Google Sheets v4 client for `values.get`.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl GoogleSheetsClient {
    pub fn new(tokens: TokenProvider, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_SHEETS_ENDPOINT.to_string(),
            tokens,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, FetchError> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(FetchError::Endpoint("endpoint must not be empty".to_string()));
        }
        self.base_url = trimmed.trim_end_matches('/').to_string();
        Ok(self)
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| FetchError::Endpoint(format!("{}: {err}", self.base_url)))?;
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                FetchError::Endpoint(format!("{} is not an absolute URL", self.base_url))
            })?;
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_values(&self, sheet_id: &str, worksheet: &str) -> Result<ValueRange, FetchError> {
        let range = a1_sheet_range(worksheet);
        let url = self.url_with_segments(&["spreadsheets", sheet_id, "values", &range])?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .query(&[
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
                ("majorDimension", "ROWS"),
            ])
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<ValueRange>().await?);
        }

        let body = body_text(response.text().await);
        if status == reqwest::StatusCode::BAD_REQUEST && body.contains("Unable to parse range") {
            return Err(FetchError::WorksheetNotFound {
                sheet_id: sheet_id.to_string(),
                worksheet: worksheet.to_string(),
            });
        }
        Err(FetchError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl WorksheetSource for GoogleSheetsClient {
    fn kind(&self) -> &'static str {
        "google_sheets"
    }

    async fn fetch_worksheet(
        &self,
        sheet_id: &str,
        worksheet: &str,
    ) -> Result<RawWorksheet, FetchError> {
        let values = self.get_values(sheet_id, worksheet).await?;
        debug!(
            sheet_id,
            range = %values.range,
            rows = values.values.len(),
            "Fetched worksheet values"
        );
        Ok(RawWorksheet::from_json_values(worksheet, values.values))
    }
}

/// A whole-sheet A1 range. Names other than plain words need quoting.
fn a1_sheet_range(worksheet: &str) -> String {
    if worksheet.chars().all(|c| c.is_alphanumeric() || c == '_') {
        worksheet.to_string()
    } else {
        format!("'{}'", worksheet.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesboard_sheets::Cell;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            TokenProvider::Static("test-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_endpoint(&server.uri())
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_unformatted_values_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/Salg"))
            .and(query_param("valueRenderOption", "UNFORMATTED_VALUE"))
            .and(query_param("dateTimeRenderOption", "FORMATTED_STRING"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Salg!A1:Z1000",
                "majorDimension": "ROWS",
                "values": [
                    ["Produkt", "Pris", "Dato for salg"],
                    ["Annonce", 1250, "01-07-2025"]
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let sheet = client.fetch_worksheet("sheet-123", "Salg").await.unwrap();

        assert_eq!(sheet.name, "Salg");
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][1], Cell::Number(1250.0));
    }

    #[tokio::test]
    async fn worksheet_without_values_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/Salg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Salg!A1:Z1000",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let sheet = client.fetch_worksheet("sheet-123", "Salg").await.unwrap();
        assert!(sheet.rows.is_empty());
    }

    #[tokio::test]
    async fn unknown_worksheet_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Unable to parse range: Mersalg",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_worksheet("sheet-123", "Mersalg").await.unwrap_err();
        assert!(matches!(err, FetchError::WorksheetNotFound { .. }));
    }

    #[tokio::test]
    async fn rate_limit_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Quota exceeded"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_worksheet("sheet-123", "Salg").await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("Quota"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn worksheet_names_with_spaces_are_quoted() {
        assert_eq!(a1_sheet_range("Salg"), "Salg");
        assert_eq!(a1_sheet_range("Salg 2025"), "'Salg 2025'");
        assert_eq!(a1_sheet_range("Kim's"), "'Kim''s'");
    }
}
