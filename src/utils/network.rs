use std::sync::Arc;

use futures::StreamExt;
use log::debug;

use crate::pefti_error::{PeftiError, PeftiErrorKind};

/// Streams the body of `url` to `on_chunk`, one `Bytes` chunk at a time, in the
/// order received. This is the transport side of the loader's producer role;
/// `on_chunk` is responsible for claiming and publishing ring slots.
pub async fn stream_url<F>(client: &Arc<reqwest::Client>, url: &str, mut on_chunk: F) -> Result<(), PeftiError>
where
    F: FnMut(&[u8]),
{
    debug!("fetching {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| PeftiError::new(PeftiErrorKind::Transport, format!("GET {url} failed: {err}")))?
        .error_for_status()
        .map_err(|err| PeftiError::new(PeftiErrorKind::Transport, format!("GET {url} returned an error status: {err}")))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|err| PeftiError::new(PeftiErrorKind::Transport, format!("failed reading chunk from {url}: {err}")))?;
        on_chunk(&bytes);
    }
    Ok(())
}
