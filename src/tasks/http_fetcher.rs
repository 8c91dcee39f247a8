use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Proxy};
use url::Url;
use uuid::Uuid;

use crate::{
    types::{
        configs::http_fetcher_config::HttpFetcherConfig,
        error::AppError,
        structs::{link::Link, page::FetchedPage},
        traits::{fetcher::Fetcher, object_store::ObjectStore},
    },
    utils::web::get_user_agent,
};

/// Downloads pages with a plain GET and optionally keeps a copy of every body
/// in an object store.
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: Option<u64>,
    object_store: Option<Arc<dyn ObjectStore>>,
}

impl HttpFetcher {
    pub fn new(
        config: &HttpFetcherConfig,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self, AppError> {
        if config.timeout <= 0 {
            return Err(AppError::configuration("http timeout must be positive"));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout as u64))
            .user_agent(get_user_agent(config.user_agent.clone()));

        if let Some(proxy) = &config.proxy_server {
            let proxy = Proxy::all(proxy).map_err(|e| {
                AppError::configuration(format!("invalid proxy {}: {}", proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            max_body_bytes: config.max_body_bytes,
            object_store,
        })
    }

    fn check_size(&self, link: &Link, size: u64) -> Result<(), AppError> {
        match self.max_body_bytes {
            Some(max) if size > max => Err(AppError::Fetch(format!(
                "{} is larger than {} bytes",
                link, max
            ))),
            _ => Ok(()),
        }
    }

    async fn download(&self, link: &Link) -> Result<(u16, Url, Bytes), AppError> {
        let mut resp = self.client.get(link.as_str()).send().await?;
        let status = resp.status();
        let final_url = resp.url().clone();

        if !status.is_success() {
            return Err(AppError::Http {
                status: status.as_u16() as i64,
                method: "GET".to_string(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        if let Some(length) = resp.content_length() {
            self.check_size(link, length)?;
        }

        let mut body = BytesMut::new();

        while let Some(chunk) = resp.chunk().await? {
            body.extend_from_slice(&chunk);
            self.check_size(link, body.len() as u64)?;
        }

        Ok((status.as_u16(), final_url, body.freeze()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, link: &Link) -> Result<FetchedPage, AppError> {
        let (status, final_url, body) = self.download(link).await?;

        let storage_key = match &self.object_store {
            Some(store) => {
                let key = Uuid::new_v4().to_string();
                store.put(&key, &body).await?;
                Some(key)
            }
            None => None,
        };

        log::debug!("fetched {} ({} bytes)", link, body.len());

        Ok(FetchedPage {
            link: link.clone(),
            final_url,
            status,
            body,
            storage_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;

    use httpmock::{Method::GET, MockServer};

    use crate::services::object_store::fs::FileSystemObjectStore;

    use super::*;

    fn config() -> HttpFetcherConfig {
        HttpFetcherConfig {
            proxy_server: None,
            timeout: 5,
            user_agent: Some("subjectscope-test".to_string()),
            max_body_bytes: Some(64),
        }
    }

    #[tokio::test]
    async fn test_request_success() {
        let path = temp_dir().join(Uuid::new_v4().to_string());
        let store: Arc<dyn ObjectStore> = Arc::new(FileSystemObjectStore::new(path).await.unwrap());
        let fetcher = HttpFetcher::new(&config(), Some(store.clone())).unwrap();
        let test_response = "<a href=\"/wiki/Physics\">Physics</a>";

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/wiki/Albert_Einstein")
                .header("user-agent", "subjectscope-test");

            then.status(200).body(test_response);
        });

        let link = Link::parse(&server.url("/wiki/Albert_Einstein")).unwrap();
        let page = fetcher.fetch(&link).await.unwrap();

        mock.assert();

        assert_eq!(page.status, 200);
        assert_eq!(page.final_url.as_str(), server.url("/wiki/Albert_Einstein"));
        assert_eq!(page.size(), test_response.len() as u64);
        assert_eq!(page.text(), test_response);

        let key = page.storage_key.unwrap();
        let stored = store.get(&key).await.unwrap();

        assert_eq!(String::from_utf8(stored).unwrap(), test_response);
    }

    #[tokio::test]
    async fn test_final_url_follows_redirect() {
        let fetcher = HttpFetcher::new(&config(), None).unwrap();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/docs");

            then.status(301).header("location", server.url("/docs/"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/docs/");

            then.status(200).body("<a href=\"intro.html\">Intro</a>");
        });

        let link = Link::parse(&server.url("/docs/")).unwrap();
        let page = fetcher.fetch(&link).await.unwrap();

        assert_eq!(page.link.as_str(), server.url("/docs"));
        assert_eq!(page.final_url.as_str(), server.url("/docs/"));
        assert_eq!(
            page.resolve("intro.html").unwrap().as_str(),
            server.url("/docs/intro.html")
        );
    }

    #[tokio::test]
    async fn test_request_bad_response() {
        let fetcher = HttpFetcher::new(&config(), None).unwrap();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");

            then.status(404).body("not here");
        });

        let link = Link::parse(&server.url("/missing")).unwrap();
        let err = fetcher.fetch(&link).await.unwrap_err();

        assert!(matches!(err, AppError::Http { status: 404, .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let fetcher = HttpFetcher::new(&config(), None).unwrap();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/large");

            then.status(200).body("x".repeat(1024));
        });

        let link = Link::parse(&server.url("/large")).unwrap();

        assert!(matches!(
            fetcher.fetch(&link).await.unwrap_err(),
            AppError::Fetch(_)
        ));
    }

    #[tokio::test]
    async fn test_request_error() {
        let fetcher = HttpFetcher::new(&config(), None).unwrap();
        // Nothing listens on the discard port
        let link = Link::parse("http://127.0.0.1:9/").unwrap();

        assert!(!fetcher.fetch(&link).await.unwrap_err().is_fatal());
    }

    #[test]
    fn test_invalid_config() {
        let bad_timeout = HttpFetcherConfig {
            timeout: 0,
            ..config()
        };

        assert!(matches!(HttpFetcher::new(&bad_timeout, None), Err(e) if e.is_fatal()));
    }
}
