//! Resource download over the browser's fetch API
use gloo::net::http::{Request, Response};
use wasm_canvas_core::{Fetch, LoadError};

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserFetcher;

impl Fetch for BrowserFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = get(url).await?;
        response
            .binary()
            .await
            .map_err(|err| LoadError::fetch(url, err))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        let response = get(url).await?;
        response.text().await.map_err(|err| LoadError::fetch(url, err))
    }
}

async fn get(url: &str) -> Result<Response, LoadError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|err| LoadError::fetch(url, err))?;

    if !response.ok() {
        return Err(LoadError::fetch(
            url,
            format!("{} {}", response.status(), response.status_text()),
        ));
    }
    Ok(response)
}
