//! Platform API client
//!
//! One method per endpoint. Every method issues exactly one request and never
//! retries; callers decide what a failure means for their scope.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::document::CommentDocument;
use super::error::ApiError;
use super::types::{ContentHandle, Envelope, ResolvedStream, SearchData, ViewData};
use crate::config::Endpoints;
use crate::http::{RawResponse, Transport};

/// Handles found on one search page, in page order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub handles: Vec<ContentHandle>,
}

/// Client for the search, view and comment endpoints
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Query one page of video search results
    #[instrument(skip(self), level = "debug")]
    pub async fn search_page(&self, keyword: &str, page: u32) -> Result<SearchPage, ApiError> {
        let page_param = page.to_string();
        let url = Url::parse_with_params(
            &self.endpoints.search_url,
            &[
                ("search_type", "video"),
                ("keyword", keyword),
                ("page", page_param.as_str()),
            ],
        )?;

        let response = self.transport.get(&url).await?;
        let data = unwrap_envelope::<SearchData>(&response)?.unwrap_or_default();

        let handles = data
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| item.bvid)
            .filter(|bvid| !bvid.is_empty())
            .map(ContentHandle::new)
            .collect::<Vec<_>>();
        debug!("Search page {} returned {} handles", page, handles.len());

        Ok(SearchPage { handles })
    }

    /// Resolve a handle to its stream identifier and title
    #[instrument(skip(self), fields(handle = %handle), level = "debug")]
    pub async fn resolve(&self, handle: &ContentHandle) -> Result<ResolvedStream, ApiError> {
        let url = Url::parse_with_params(&self.endpoints.view_url, &[("bvid", handle.as_str())])?;
        let response = self.transport.get(&url).await?;

        let data = unwrap_embedded::<ViewData>(&response)?.ok_or(ApiError::MissingData)?;
        Ok(data.into())
    }

    /// Download and parse the comment document of a stream
    #[instrument(skip(self, stream), fields(stream_id = stream.stream_id), level = "debug")]
    pub async fn fetch_document(
        &self,
        stream: &ResolvedStream,
    ) -> Result<CommentDocument, ApiError> {
        let base = self.endpoints.comment_base_url.trim_end_matches('/');
        let url = Url::parse(&format!("{}/{}.xml", base, stream.stream_id))?;

        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(ApiError::Status(response.status));
        }

        let document = CommentDocument::parse(&response.text())?;
        debug!("Comment document holds {} entries", document.len());
        Ok(document)
    }

    /// Raw comment texts of a stream, blank entries dropped
    pub async fn fetch_comments(&self, stream: &ResolvedStream) -> Result<Vec<String>, ApiError> {
        Ok(self.fetch_document(stream).await?.into_entries())
    }
}

/// Check transport status and embedded code, returning the payload
fn unwrap_envelope<D: DeserializeOwned>(response: &RawResponse) -> Result<Option<D>, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Status(response.status));
    }

    let envelope: Envelope<D> = serde_json::from_slice(&response.body)?;
    envelope_data(envelope)
}

/// Judge the response by its embedded code whatever the transport status
///
/// The transport status only matters when the body is not an envelope.
fn unwrap_embedded<D: DeserializeOwned>(response: &RawResponse) -> Result<Option<D>, ApiError> {
    match serde_json::from_slice::<Envelope<D>>(&response.body) {
        Ok(envelope) => envelope_data(envelope),
        Err(_) if !response.is_success() => Err(ApiError::Status(response.status)),
        Err(e) => Err(e.into()),
    }
}

fn envelope_data<D>(envelope: Envelope<D>) -> Result<Option<D>, ApiError> {
    if envelope.code != 0 {
        warn!("API reported code {}: {}", envelope.code, envelope.message);
        return Err(ApiError::Application {
            code: envelope.code,
            message: envelope.message,
        });
    }

    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestHeaders;
    use crate::http::HttpClient;
    use crate::http::mock_transport::MockTransport;
    use mockito::{Matcher, Server};

    fn http_client(server: &Server) -> ApiClient<HttpClient> {
        let transport = HttpClient::new(&RequestHeaders::default()).unwrap();
        ApiClient::new(transport, Endpoints::with_base(&server.url()))
    }

    #[tokio::test]
    async fn test_search_page_success() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/x/web-interface/search/type")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_type".into(), "video".into()),
                Matcher::UrlEncoded("keyword".into(), "大模型".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code":0,"message":"0","data":{"result":[{"bvid":"BV1a"},{"bvid":""},{"bvid":"BV1b"}]}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = http_client(&server);
        let page = client.search_page("大模型", 2).await.unwrap();

        assert_eq!(
            page.handles,
            vec![ContentHandle::new("BV1a"), ContentHandle::new("BV1b")]
        );
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_page_missing_result_is_empty() {
        let mock = MockTransport::new();
        mock.respond("search/type", 200, r#"{"code":0,"data":{}}"#)
            .await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let page = client.search_page("kw", 1).await.unwrap();
        assert!(page.handles.is_empty());
    }

    #[tokio::test]
    async fn test_search_page_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/x/web-interface/search/type")
            .match_query(Matcher::Any)
            .with_status(412)
            .with_body("<html>blocked</html>")
            .create_async()
            .await;

        let client = http_client(&server);
        let err = client.search_page("kw", 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Status(412)));
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/x/web-interface/view")
            .match_query(Matcher::UrlEncoded("bvid".into(), "BV1xx".into()))
            .with_status(200)
            .with_body(r#"{"code":0,"message":"0","data":{"cid":123456,"title":"测试视频","bvid":"BV1xx"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = http_client(&server);
        let stream = client.resolve(&ContentHandle::new("BV1xx")).await.unwrap();

        assert_eq!(stream.stream_id, 123456);
        assert_eq!(stream.title, "测试视频");
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_application_error_carries_message() {
        let mock = MockTransport::new();
        mock.respond("view", 200, r#"{"code":-404,"message":"啥都木有"}"#)
            .await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let err = client.resolve(&ContentHandle::new("BVgone")).await.unwrap_err();
        match err {
            ApiError::Application { code, message } => {
                assert_eq!(code, -404);
                assert_eq!(message, "啥都木有");
            }
            other => panic!("Expected Application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_reads_code_from_error_status_body() {
        let mock = MockTransport::new();
        mock.respond("view", 404, r#"{"code":-404,"message":"啥都木有"}"#)
            .await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let err = client.resolve(&ContentHandle::new("BVgone")).await.unwrap_err();
        match err {
            ApiError::Application { code, message } => {
                assert_eq!(code, -404);
                assert_eq!(message, "啥都木有");
            }
            other => panic!("Expected Application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_status_without_envelope() {
        let mock = MockTransport::new();
        mock.respond("view", 502, "<html>Bad Gateway</html>").await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let err = client.resolve(&ContentHandle::new("BV1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Status(502)));
    }

    #[tokio::test]
    async fn test_search_page_null_result_is_empty() {
        let mock = MockTransport::new();
        mock.respond("search/type", 200, r#"{"code":0,"data":{"result":null}}"#)
            .await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let page = client.search_page("kw", 1).await.unwrap();
        assert!(page.handles.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_without_data() {
        let mock = MockTransport::new();
        mock.respond("view", 200, r#"{"code":0,"message":"0"}"#).await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let err = client.resolve(&ContentHandle::new("BV1")).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingData));
    }

    #[tokio::test]
    async fn test_fetch_comments() {
        let mut server = Server::new_async().await;
        let mock_server = server
            .mock("GET", "/987.xml")
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(r#"<?xml version="1.0"?><i><chatid>987</chatid><d p="1">第一</d><d p="2"> </d><d p="3">第二</d></i>"#)
            .expect(1)
            .create_async()
            .await;

        let client = http_client(&server);
        let stream = ResolvedStream {
            stream_id: 987,
            title: "t".to_string(),
        };
        let comments = client.fetch_comments(&stream).await.unwrap();

        assert_eq!(comments, vec!["第一", "第二"]);
        mock_server.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_document_status_error() {
        let mock = MockTransport::new();
        mock.respond(".xml", 503, "").await;
        let client = ApiClient::new(mock, Endpoints::with_base("http://test"));

        let stream = ResolvedStream {
            stream_id: 1,
            title: String::new(),
        };
        let err = client.fetch_document(&stream).await.unwrap_err();
        assert!(matches!(err, ApiError::Status(503)));
    }
}
