use std::sync::{Arc, Mutex};
use std::thread;

use futures::StreamExt;
use log::{debug, error, info};

use crate::model::config::Config;
use crate::model::playlist::{IptvChannel, Playlist};
use crate::pefti_error::{PeftiError, PeftiErrorKind};
use crate::processing::loader;
use crate::processing::parser::m3u::consume_m3u;
use crate::processing::parser::xmltv::build_epg;
use crate::processing::processor::filter::filter;
use crate::processing::processor::mapper::ChannelsMapper;
use crate::processing::processor::sorter::render_playlist;
use crate::processing::processor::transformer::{run_post_pipeline_pass, transform};
use crate::processing::ring::{ByteRing, RecordRing, BYTE_RING_CAPACITY, RECORD_RING_CAPACITY};

/// The outcome of a full run: the rendered playlist, the rendered EPG (if any
/// EPG sources were configured), and every error collected along the way.
/// Partial failures do not stop the other sources; they are surfaced to the
/// caller for the exit-code decision.
pub struct RunOutcome {
    pub playlist: String,
    pub epg: Option<String>,
    pub errors: Vec<PeftiError>,
}

/// Top-level orchestration: runs one Loader/Parser/Filter/Transformer
/// pipeline per playlist URL concurrently, joins them, runs the Orderer, then
/// (gated on the playlist pipelines having completed) fetches and rewrites
/// every EPG source.
pub fn run(cfg: &Config, client: &Arc<reqwest::Client>) -> RunOutcome {
    let mut errors = Vec::new();

    let playlist = Mutex::new(Playlist::with_capacity(1024));
    let mut mapper = ChannelsMapper::new(&cfg.channels_templates);

    thread::scope(|scope| {
        let handles: Vec<_> = cfg
            .playlists_urls
            .iter()
            .map(|url| {
                let playlist = &playlist;
                let mapper = &mapper;
                scope.spawn(move || run_one_source(url, cfg, client, playlist, mapper))
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(source_errors) => errors.extend(source_errors),
                Err(_) => errors.push(PeftiError::new(PeftiErrorKind::Io, "a pipeline thread panicked".to_string())),
            }
        }
    });

    let mut playlist = playlist.into_inner().unwrap();
    run_post_pipeline_pass(cfg, &mut mapper, &mut playlist);
    let rendered_playlist = render_playlist(cfg, &mapper, &playlist);

    let epg = if cfg.epgs_urls.is_empty() {
        None
    } else {
        match run_epg_stage(cfg, client, &mut playlist) {
            Ok(rendered) => Some(rendered),
            Err(err) => {
                errors.push(err);
                None
            }
        }
    };

    RunOutcome { playlist: rendered_playlist, epg, errors }
}

/// One source's pipeline: four stages, each on its own thread, joined by a
/// byte ring and two record rings. The loader drives its `reqwest` future on
/// a small single-threaded runtime local to its thread.
fn run_one_source(url: &str, cfg: &Config, client: &Arc<reqwest::Client>, playlist: &Mutex<Playlist>, mapper: &ChannelsMapper) -> Vec<PeftiError> {
    let byte_ring = ByteRing::new(BYTE_RING_CAPACITY);
    let parsed_ring: RecordRing<IptvChannel> = RecordRing::new(RECORD_RING_CAPACITY);
    let filtered_ring: RecordRing<IptvChannel> = RecordRing::new(RECORD_RING_CAPACITY);
    let persist_dir = cfg.persist_dir.clone();

    let mut errors = Vec::new();
    thread::scope(|scope| {
        let loader_handle = scope.spawn(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build loader runtime");
            runtime.block_on(loader::load(client, url, &byte_ring, persist_dir.as_deref()))
        });
        let parser_handle = scope.spawn(|| consume_m3u(&byte_ring, &parsed_ring));
        let filter_handle = scope.spawn(|| filter(&parsed_ring, &filtered_ring, cfg, mapper));
        let transformer_handle = scope.spawn(|| transform(&filtered_ring, cfg, mapper, playlist));

        let loader_result = loader_handle.join().unwrap_or_else(|_| Err(PeftiError::new(PeftiErrorKind::Io, format!("loader thread for {url} panicked"))));
        if let Err(err) = loader_result {
            errors.push(err);
        }
        if parser_handle.join().is_err() {
            errors.push(PeftiError::new(PeftiErrorKind::Io, format!("parser thread for {url} panicked")));
        }
        if filter_handle.join().is_err() {
            errors.push(PeftiError::new(PeftiErrorKind::Io, format!("filter thread for {url} panicked")));
        }
        if transformer_handle.join().is_err() {
            errors.push(PeftiError::new(PeftiErrorKind::Io, format!("transformer thread for {url} panicked")));
        }
    });

    debug!("pipeline for {url} drained");
    errors
}

/// Fetches and rewrites every EPG source once the playlist pipelines have
/// drained and the destination playlist's `tvg-id` set is queryable.
fn run_epg_stage(cfg: &Config, client: &Arc<reqwest::Client>, playlist: &mut Playlist) -> Result<String, PeftiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| PeftiError::new(PeftiErrorKind::Io, err.to_string()))?;

    let documents: Result<Vec<String>, PeftiError> = cfg.epgs_urls.iter().map(|url| runtime.block_on(fetch_document(client, url))).collect();
    let documents = documents?;
    build_epg(&documents, playlist)
}

async fn fetch_document(client: &Arc<reqwest::Client>, url: &str) -> Result<String, PeftiError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Writes `contents` to `path`, wrapping any I/O failure in a [`PeftiError`].
pub fn write_output(path: &str, contents: &str) -> Result<(), PeftiError> {
    std::fs::write(path, contents).map_err(|err| PeftiError::new(PeftiErrorKind::Io, format!("cannot write {path}: {err}")))
}

/// Runs the full pipeline and writes the playlist (and, if configured, EPG)
/// to disk. Returns the collected errors; an empty vec means full success.
pub fn exec_processing(cfg: &Config, client: &Arc<reqwest::Client>) -> Vec<PeftiError> {
    let outcome = run(cfg, client);
    let mut errors = outcome.errors;

    match write_output(&cfg.new_playlist_filename, &outcome.playlist) {
        Ok(()) => info!("wrote playlist to {}", cfg.new_playlist_filename),
        Err(err) => errors.push(err),
    }

    if let Some(epg) = outcome.epg {
        if let Some(filename) = &cfg.new_epg_filename {
            match write_output(filename, &epg) {
                Ok(()) => info!("wrote epg to {filename}"),
                Err(err) => errors.push(err),
            }
        }
    }

    for err in &errors {
        error!("{err}");
    }
    errors
}
