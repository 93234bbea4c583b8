use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::pefti_error::{PeftiError, PeftiErrorKind};

/// One channel template from `channels.allow`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChannelTemplate {
    #[serde(rename = "i", default)]
    pub include: Vec<String>,
    #[serde(rename = "e", default)]
    pub exclude: Vec<String>,
    #[serde(rename = "n", default)]
    pub new_name: Option<String>,
    #[serde(rename = "t", default)]
    pub tags: IndexMap<String, String>,
}

impl ChannelTemplate {
    /// `new_name` defaults to `include[0]` when the template does not rename.
    pub fn effective_new_name(&self) -> &str {
        self.new_name
            .as_deref()
            .unwrap_or_else(|| self.include.first().map_or("", String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatesLocation {
    #[default]
    None,
    Inline,
    Append,
}

impl DuplicatesLocation {
    fn from_config_value(value: &str) -> DuplicatesLocation {
        match value {
            "inline" => DuplicatesLocation::Inline,
            "append" => DuplicatesLocation::Append,
            _ => DuplicatesLocation::None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawResources {
    playlists: Vec<String>,
    new_playlist: String,
    #[serde(default)]
    epgs: Vec<String>,
    #[serde(default)]
    new_epg: Option<String>,
    #[serde(default)]
    persist_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawGroups {
    #[serde(default)]
    allow: IndexSet<String>,
    #[serde(default)]
    block: IndexSet<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawUrls {
    #[serde(default)]
    block: IndexSet<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawChannels {
    #[serde(default)]
    copy_group_title: bool,
    #[serde(default)]
    number_of_duplicates: i64,
    #[serde(default)]
    duplicates_location: String,
    #[serde(default)]
    sort_qualities: Vec<String>,
    #[serde(default)]
    tags_block: Vec<String>,
    #[serde(default)]
    block: Vec<String>,
    #[serde(default)]
    allow: Vec<ChannelTemplate>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    resources: RawResources,
    #[serde(default)]
    groups: RawGroups,
    #[serde(default)]
    urls: RawUrls,
    #[serde(default)]
    channels: RawChannels,
}

/// The validated, typed view over the configuration document. Built once at
/// startup by [`Config::read`] and never mutated afterwards.
#[derive(Debug)]
pub struct Config {
    pub playlists_urls: Vec<String>,
    pub new_playlist_filename: String,
    pub epgs_urls: Vec<String>,
    pub new_epg_filename: Option<String>,
    pub persist_dir: Option<String>,
    pub allowed_groups: IndexSet<String>,
    pub blocked_groups: IndexSet<String>,
    pub blocked_channels: Vec<String>,
    pub blocked_urls: IndexSet<String>,
    pub blocked_tags: Vec<String>,
    pub copy_group_title: bool,
    pub num_duplicates: usize,
    pub duplicates_location: DuplicatesLocation,
    pub sort_qualities: Vec<String>,
    pub channels_templates: Vec<ChannelTemplate>,
}

impl Config {
    pub fn read(path: &str) -> Result<Config, PeftiError> {
        let file = std::fs::File::open(path)
            .map_err(|err| PeftiError::new(PeftiErrorKind::Config, format!("cannot open config file {path}: {err}")))?;
        let raw: RawConfig = serde_yaml::from_reader(file)
            .map_err(|err| PeftiError::new(PeftiErrorKind::Config, format!("cannot parse config file {path}: {err}")))?;
        Config::from_raw(raw).and_then(Config::prepare)
    }

    fn from_raw(raw: RawConfig) -> Result<Config, PeftiError> {
        let duplicates_location = DuplicatesLocation::from_config_value(&raw.channels.duplicates_location);
        let num_duplicates = if duplicates_location == DuplicatesLocation::None {
            0
        } else {
            usize::try_from(raw.channels.number_of_duplicates.max(0))
                .map_err(|err| PeftiError::new(PeftiErrorKind::Config, format!("invalid number_of_duplicates: {err}")))?
        };

        Ok(Config {
            playlists_urls: raw.resources.playlists,
            new_playlist_filename: raw.resources.new_playlist,
            epgs_urls: raw.resources.epgs,
            new_epg_filename: raw.resources.new_epg,
            persist_dir: raw.resources.persist_dir,
            allowed_groups: raw.groups.allow,
            blocked_groups: raw.groups.block,
            blocked_channels: raw.channels.block,
            blocked_urls: raw.urls.block,
            blocked_tags: raw.channels.tags_block,
            copy_group_title: raw.channels.copy_group_title,
            num_duplicates,
            duplicates_location,
            sort_qualities: raw.channels.sort_qualities,
            channels_templates: raw.channels.allow,
        })
    }

    /// Validates the invariants from the data model: non-empty sources, non-empty
    /// output filename, and an EPG filename when EPG sources are configured.
    fn prepare(self) -> Result<Config, PeftiError> {
        if self.playlists_urls.is_empty() {
            return Err(PeftiError::new(PeftiErrorKind::Config, "resources.playlists must not be empty".to_string()));
        }
        if self.new_playlist_filename.is_empty() {
            return Err(PeftiError::new(PeftiErrorKind::Config, "resources.new_playlist must not be empty".to_string()));
        }
        if !self.epgs_urls.is_empty() && self.new_epg_filename.as_deref().unwrap_or("").is_empty() {
            return Err(PeftiError::new(PeftiErrorKind::Config, "resources.new_epg is required when resources.epgs is set".to_string()));
        }
        Ok(self)
    }
}
