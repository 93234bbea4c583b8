use std::io::Write;
use std::sync::Arc;

use log::{debug, warn};

use crate::pefti_error::PeftiError;
use crate::processing::ring::ByteRing;
use crate::utils::stream_url;

/// Streams one playlist URL's response body into `ring`, then writes the
/// end-of-stream sentinel. The sentinel is written on every exit path,
/// including a transport error, so the parser downstream always terminates.
pub async fn load(client: &Arc<reqwest::Client>, url: &str, ring: &ByteRing, persist_dir: Option<&str>) -> Result<(), PeftiError> {
    let mut persist_file = persist_dir.map(|dir| prepare_persist_file(dir, url));

    let result = stream_url(client, url, |chunk| {
        if let Some(Some(file)) = persist_file.as_mut() {
            if let Err(err) = file.write_all(chunk) {
                warn!("failed to persist chunk from {url}: {err}");
            }
        }
        ring.write(chunk);
    })
    .await;

    ring.write_sentinel();
    debug!("loader for {url} wrote end-of-stream sentinel");
    result
}

fn prepare_persist_file(dir: &str, url: &str) -> Option<std::fs::File> {
    std::fs::create_dir_all(dir).ok()?;
    let name = url.rsplit('/').next().unwrap_or("source").to_string();
    let path = std::path::Path::new(dir).join(format!("{name}.m3u"));
    std::fs::File::create(path).ok()
}
