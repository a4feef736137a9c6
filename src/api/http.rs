//! The `Backend` implementation that talks to the statement-parsing server over HTTP.

use crate::api::{Backend, Endpoint, TransactionsQuery};
use crate::dashboard::date_range::QUERY_DATE_FORMAT;
use crate::dashboard::{Period, PdfFile};
use crate::model::{
    CategorySummary, Summary, SummaryResponse, Transaction, TransactionsResponse, UploadResponse,
};
use crate::Result;
use anyhow::{anyhow, Context};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, trace};
use url::Url;

/// The multipart field that every uploaded file is sent under.
const FILES_FIELD: &str = "files";

/// Calls the backend at a base URL such as `http://localhost:8000`.
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> Result<Self> {
        let mut base =
            Url::parse(api_url).with_context(|| format!("Invalid API URL '{api_url}'"))?;
        // Url::join replaces the last path segment unless the path ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url> {
        self.base
            .join(endpoint.path())
            .with_context(|| format!("Unable to build the URL for '{}'", endpoint.path()))
    }

    /// Sends a GET request and decodes the JSON body. Any failure is reported under the endpoint's
    /// fixed message with the details underneath it.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint, url: Url) -> Result<T> {
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(endpoint.failure_message())?;
        let response = check_status(response)
            .await
            .context(endpoint.failure_message())?;
        response
            .json::<T>()
            .await
            .context(endpoint.failure_message())
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, files: &[PdfFile]) -> Result<UploadResponse> {
        let endpoint = Endpoint::Upload;
        let url = self.url(endpoint)?;
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime)
                .with_context(|| format!("Bad content type '{}'", file.mime))?;
            form = form.part(FILES_FIELD, part);
        }
        debug!("Uploading {} files to {url}", files.len());
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context(endpoint.failure_message())?;
        let response = check_status(response)
            .await
            .context(endpoint.failure_message())?;
        response
            .json::<UploadResponse>()
            .await
            .context(endpoint.failure_message())
    }

    async fn transactions(&self, query: &TransactionsQuery) -> Result<Vec<Transaction>> {
        let mut url = self.url(Endpoint::Transactions)?;
        if query.start.is_some() || query.end.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(start) = query.start {
                pairs.append_pair("start", &start.format(QUERY_DATE_FORMAT).to_string());
            }
            if let Some(end) = query.end {
                pairs.append_pair("end", &end.format(QUERY_DATE_FORMAT).to_string());
            }
        }
        let body: TransactionsResponse = self.get_json(Endpoint::Transactions, url).await?;
        Ok(body.transactions)
    }

    async fn summary(&self, period: Period) -> Result<BTreeMap<String, Summary>> {
        let endpoint = Endpoint::from(period);
        let url = self.url(endpoint)?;
        let body: SummaryResponse<Summary> = self.get_json(endpoint, url).await?;
        Ok(body.summary)
    }

    async fn category_summary(&self) -> Result<BTreeMap<String, CategorySummary>> {
        let url = self.url(Endpoint::CategorySummary)?;
        let body: SummaryResponse<CategorySummary> =
            self.get_json(Endpoint::CategorySummary, url).await?;
        Ok(body.summary)
    }

    async fn recurring(&self) -> Result<Vec<Transaction>> {
        let url = self.url(Endpoint::Recurring)?;
        let body: TransactionsResponse = self.get_json(Endpoint::Recurring, url).await?;
        Ok(body.transactions)
    }
}

/// Turns a non-2xx response into an error carrying the status and body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    debug!("Backend responded with status {status}: {body}");
    Err(anyhow!("Backend responded with status {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::upload::PDF_MIME;
    use crate::model::Amount;
    use chrono::NaiveDate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves exactly one canned response and hands back the raw request it received.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let headers = text[..header_end].to_lowercase();
            let body_len = buf.len() - (header_end + 4);
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());
            let done = match content_length {
                Some(len) => body_len >= len,
                None if headers.contains("transfer-encoding: chunked") => {
                    text.ends_with("0\r\n\r\n")
                }
                None => true,
            };
            if done {
                break;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let backend = HttpBackend::new("http://example.com/api").unwrap();
        assert_eq!(
            backend.url(Endpoint::WeeklySummary).unwrap().as_str(),
            "http://example.com/api/summary/weekly"
        );
        let backend = HttpBackend::new("http://localhost:8000").unwrap();
        assert_eq!(
            backend.url(Endpoint::Upload).unwrap().as_str(),
            "http://localhost:8000/upload"
        );
    }

    #[test]
    fn test_bad_base_url() {
        assert!(HttpBackend::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_transactions_with_range() {
        let body = r#"{"transactions":[{"id":"1","date":"2024-01-15","description":"Salary Payment","amount":5000000,"merchant_canonical":"PT Maju Jaya","category":"Income","confidence":0.98,"recurring":true,"import_id":"x"}]}"#;
        let (base, handle) = serve_once("200 OK", body).await;
        let backend = HttpBackend::new(&base).unwrap();
        let query = TransactionsQuery {
            start: Some(d("2024-01-01")),
            end: Some(d("2024-01-31")),
        };
        let found = backend.transactions(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount(), Amount::new(5_000_000));

        let request = handle.await.unwrap();
        assert!(
            request.starts_with("GET /transactions?start=2024-01-01&end=2024-01-31 HTTP/1.1"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn test_transactions_without_range() {
        let (base, handle) = serve_once("200 OK", r#"{"transactions":[]}"#).await;
        let backend = HttpBackend::new(&base).unwrap();
        let found = backend
            .transactions(&TransactionsQuery::all())
            .await
            .unwrap();
        assert!(found.is_empty());
        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /transactions HTTP/1.1"), "{request}");
    }

    #[tokio::test]
    async fn test_summary() {
        let body = r#"{"summary":{"2024-01":{"income":6500000,"spend":3494000,"net":3006000}}}"#;
        let (base, handle) = serve_once("200 OK", body).await;
        let backend = HttpBackend::new(&base).unwrap();
        let summary = backend.summary(Period::Monthly).await.unwrap();
        assert_eq!(summary["2024-01"].net, Amount::new(3_006_000));
        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /summary/monthly "), "{request}");
    }

    #[tokio::test]
    async fn test_category_summary_without_net() {
        let body = r#"{"summary":{"Food & Dining":{"income":0,"spend":1145000,"count":3}}}"#;
        let (base, _handle) = serve_once("200 OK", body).await;
        let backend = HttpBackend::new(&base).unwrap();
        let summary = backend.category_summary().await.unwrap();
        let food = summary["Food & Dining"];
        assert_eq!(food.count, 3);
        assert_eq!(food.net, Amount::new(-1_145_000));
    }

    #[tokio::test]
    async fn test_server_error_uses_fixed_message() {
        let (base, _handle) =
            serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let backend = HttpBackend::new(&base).unwrap();
        let err = backend.recurring().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch recurring transactions");
        assert!(format!("{err:#}").contains("500"));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = HttpBackend::new(&format!("http://{addr}")).unwrap();
        let err = backend.summary(Period::Daily).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch daily summary");
    }

    #[tokio::test]
    async fn test_upload_sends_one_multipart_request() {
        let (base, handle) =
            serve_once("200 OK", r#"{"import_id":"abc","parsed_count":47}"#).await;
        let backend = HttpBackend::new(&base).unwrap();
        let files = vec![
            PdfFile::new("jan.pdf", PDF_MIME, b"%PDF-jan".to_vec()),
            PdfFile::new("feb.pdf", PDF_MIME, b"%PDF-feb".to_vec()),
        ];
        let result = backend.upload(&files).await.unwrap();
        assert_eq!(result.import_id, "abc");
        assert_eq!(result.parsed_count, 47);

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /upload HTTP/1.1"), "{request}");
        assert!(request.contains("multipart/form-data"));
        assert_eq!(request.matches(r#"name="files""#).count(), 2);
        assert!(request.contains(r#"filename="jan.pdf""#));
        assert!(request.contains(r#"filename="feb.pdf""#));
        assert!(request.to_lowercase().contains("content-type: application/pdf"));
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let (base, _handle) = serve_once("422 Unprocessable Entity", r#"{"detail":"x"}"#).await;
        let backend = HttpBackend::new(&base).unwrap();
        let files = vec![PdfFile::new("jan.pdf", PDF_MIME, b"%PDF".to_vec())];
        let err = backend.upload(&files).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload PDFs");
    }
}
