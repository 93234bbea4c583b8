//! End-to-end scenarios driving the real pipeline stages (parser, filter,
//! transformer, mapper, orderer, EPG rewriter) together, bypassing only the
//! HTTP transfer layer: playlist bytes are written straight into a byte ring
//! the way a loader thread would, since fetching is an external collaborator
//! the core pipeline does not own.

use std::io::Write;
use std::sync::Mutex;

use indexmap::IndexSet;

use pefti::model::config::{ChannelTemplate, Config, DuplicatesLocation};
use pefti::model::playlist::{IptvChannel, Playlist, TAG_TVG_ID};
use pefti::processing::parser::m3u::consume_m3u;
use pefti::processing::parser::xmltv::build_epg;
use pefti::processing::processor::filter::filter;
use pefti::processing::processor::mapper::ChannelsMapper;
use pefti::processing::processor::sorter::render_playlist;
use pefti::processing::processor::transformer::{run_post_pipeline_pass, transform};
use pefti::processing::ring::{ByteRing, RecordRing, BYTE_RING_CAPACITY, RECORD_RING_CAPACITY};

fn template(include: &[&str], new_name: Option<&str>, tags: &[(&str, &str)]) -> ChannelTemplate {
    ChannelTemplate {
        include: include.iter().map(|s| (*s).to_string()).collect(),
        exclude: vec![],
        new_name: new_name.map(str::to_string),
        tags: tags.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
    }
}

fn base_config(templates: Vec<ChannelTemplate>) -> Config {
    Config {
        playlists_urls: vec!["http://example.invalid/playlist.m3u".to_string()],
        new_playlist_filename: "out.m3u".to_string(),
        epgs_urls: vec![],
        new_epg_filename: None,
        persist_dir: None,
        allowed_groups: IndexSet::new(),
        blocked_groups: IndexSet::new(),
        blocked_channels: vec![],
        blocked_urls: IndexSet::new(),
        blocked_tags: vec![],
        copy_group_title: false,
        num_duplicates: 0,
        duplicates_location: DuplicatesLocation::None,
        sort_qualities: vec![],
        channels_templates: templates,
    }
}

fn ingest(m3u: &str) -> RecordRing<IptvChannel> {
    let byte_ring = ByteRing::new(BYTE_RING_CAPACITY);
    let parsed_ring: RecordRing<IptvChannel> = RecordRing::new(RECORD_RING_CAPACITY);
    byte_ring.write(m3u.as_bytes());
    byte_ring.write_sentinel();
    consume_m3u(&byte_ring, &parsed_ring);
    parsed_ring
}

/// Runs every source through Filter and Transformer against one shared
/// mapper and destination playlist, then the post-pipeline pass, exactly
/// the way `pipeline::run` drives one stage per source before the Orderer.
fn run_pipeline<'a>(sources: &[&str], cfg: &'a Config) -> (Playlist, ChannelsMapper<'a>) {
    let mapper = ChannelsMapper::new(&cfg.channels_templates);
    let playlist_mutex = Mutex::new(Playlist::with_capacity(RECORD_RING_CAPACITY * sources.len().max(1)));
    for source in sources {
        let parsed_ring = ingest(source);
        let filtered_ring: RecordRing<IptvChannel> = RecordRing::new(RECORD_RING_CAPACITY);
        filter(&parsed_ring, &filtered_ring, cfg, &mapper);
        transform(&filtered_ring, cfg, &mapper, &playlist_mutex);
    }
    let mut playlist = playlist_mutex.into_inner().unwrap();
    let mut mapper = mapper;
    run_post_pipeline_pass(cfg, &mut mapper, &mut playlist);
    (playlist, mapper)
}

fn rendered(sources: &[&str], cfg: &Config) -> String {
    let (playlist, mapper) = run_pipeline(sources, cfg);
    render_playlist(cfg, &mapper, &playlist)
}

/// Scenario 1: one source, allow-list only, no duplicates.
#[test]
fn allow_list_rename_emits_only_the_matched_channel() {
    let mut config_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
resources:
  playlists:
    - "http://example.invalid/playlist.m3u"
  new_playlist: "out.m3u"
channels:
  allow:
    - i: ["bbc one"]
      n: "BBC 1"
"#
    )
    .unwrap();
    let cfg = Config::read(config_file.path().to_str().unwrap()).unwrap();

    let source = "#EXTINF:-1,BBC One HD\nhttp://x/bbc1\n#EXTINF:-1,CNN\nhttp://x/cnn\n#EXTINF:-1,Sport 1 FHD\nhttp://x/sport1\n";
    let out = rendered(&[source], &cfg);

    assert!(out.starts_with("#EXTM3U\n"));
    assert_eq!(out.matches("#EXTINF").count(), 1);
    assert!(out.contains(",BBC 1\n"));
    assert!(out.contains("http://x/bbc1"));
}

/// Scenario 2: a blocked group wins over everything else.
#[test]
fn blocked_group_removes_its_channel() {
    let cfg = {
        let mut cfg = base_config(vec![]);
        cfg.blocked_groups = IndexSet::from(["Adult".to_string()]);
        cfg
    };
    let source = "#EXTINF:-1 group-title=\"Adult\",Channel X\nhttp://x/a\n#EXTINF:-1 group-title=\"News\",Channel Y\nhttp://x/b\n";
    let (playlist, _) = run_pipeline(&[source], &cfg);

    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist.as_slice()[0].original_name, "Channel Y");
}

/// Scenario 3: whole-token matching rejects a substring occurring without
/// flanking non-alphanumeric characters on both sides.
#[test]
fn whole_token_match_rejects_partial_overlap() {
    let cfg = base_config(vec![template(&["HD"], None, &[])]);
    let source = "#EXTINF:-1,HDR News\nhttp://x/a\n#EXTINF:-1,CNN HD\nhttp://x/b\n";
    let (playlist, _) = run_pipeline(&[source], &cfg);

    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist.as_slice()[0].original_name, "CNN HD");
}

/// Scenario 4: inline duplicates follow their priority pick, stripped of `tvg-id`.
#[test]
fn inline_duplicates_follow_priority_pick() {
    let mut cfg = base_config(vec![template(&["bbc one"], None, &[])]);
    cfg.num_duplicates = 1;
    cfg.duplicates_location = DuplicatesLocation::Inline;
    cfg.sort_qualities = vec!["FHD".to_string(), "HD".to_string()];

    let source1 = "#EXTINF:-1 tvg-id=\"bbc1.hd\",BBC One HD\nhttp://x/u1\n";
    let source2 = "#EXTINF:-1 tvg-id=\"bbc1.sd\",BBC One\nhttp://x/u2\n";
    let out = rendered(&[source1, source2], &cfg);

    let first = out.find("http://x/u1").unwrap();
    let second = out.find("http://x/u2").unwrap();
    assert!(first < second, "HD priority pick must come before the plain duplicate");
    assert!(out.contains("tvg-id=\"bbc1.hd\""), "the priority pick keeps its tvg-id");
    assert!(!out.contains("tvg-id=\"bbc1.sd\""), "the duplicate's tvg-id must be stripped");
}

/// Scenario 5: append duplicates — all priority picks first, then the duplicate block.
#[test]
fn append_duplicates_follow_every_priority_pick() {
    let mut cfg = base_config(vec![template(&["bbc one"], None, &[]), template(&["cnn"], None, &[])]);
    cfg.num_duplicates = 1;
    cfg.duplicates_location = DuplicatesLocation::Append;
    cfg.sort_qualities = vec!["FHD".to_string(), "HD".to_string()];

    let source1 = "#EXTINF:-1,BBC One HD\nhttp://x/bbc-hd\n#EXTINF:-1,CNN\nhttp://x/cnn\n";
    let source2 = "#EXTINF:-1,BBC One\nhttp://x/bbc-sd\n";
    let out = rendered(&[source1, source2], &cfg);

    let bbc_pick = out.find("http://x/bbc-hd").unwrap();
    let cnn_pick = out.find("http://x/cnn").unwrap();
    let bbc_duplicate = out.find("http://x/bbc-sd").unwrap();
    assert!(bbc_pick < cnn_pick, "priority picks for every template precede any duplicate");
    assert!(cnn_pick < bbc_duplicate, "the duplicate block follows all priority picks");
}

/// Scenario 6: EPG tvg-id propagation through filter, transform, and the
/// XMLTV rewriter — only the channel the playlist survived to keep.
#[test]
fn epg_tvg_id_propagation_keeps_only_surviving_channel() {
    let cfg = base_config(vec![template(&["bbc one"], None, &[(TAG_TVG_ID, "bbc1.uk")])]);
    let source = "#EXTINF:-1,BBC One\nhttp://x/bbc1\n#EXTINF:-1,CNN\nhttp://x/cnn\n";
    let (mut playlist, _) = run_pipeline(&[source], &cfg);
    assert_eq!(playlist.len(), 1);

    let epg_source = r#"<tv>
<channel id="bbc1.uk"><display-name>BBC One</display-name></channel>
<channel id="cnn.us"><display-name>CNN</display-name></channel>
<programme channel="bbc1.uk" start="20260101000000" stop="20260101010000"><title>Show A</title></programme>
<programme channel="bbc1.uk" start="20260101010000" stop="20260101020000"><title>Show B</title></programme>
<programme channel="cnn.us" start="20260101000000" stop="20260101010000"><title>News 1</title></programme>
<programme channel="cnn.us" start="20260101010000" stop="20260101020000"><title>News 2</title></programme>
<programme channel="cnn.us" start="20260101020000" stop="20260101030000"><title>News 3</title></programme>
</tv>"#;

    let epg = build_epg(&[epg_source.to_string()], &mut playlist).unwrap();
    assert_eq!(epg.matches("<channel").count(), 1);
    assert_eq!(epg.matches("<programme").count(), 2);
    assert!(epg.contains(r#"id="bbc1.uk""#));
    assert!(!epg.contains("cnn.us"));
}
