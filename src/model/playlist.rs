use std::collections::HashSet;
use indexmap::IndexMap;

pub const TAG_GROUP_TITLE: &str = "group-title";
pub const TAG_TVG_ID: &str = "tvg-id";
pub const TAG_QUALITY: &str = "quality";
pub const TAG_DELETE: &str = "delete";

pub const SENTINEL_NAME: &str = "SENTINEL";

/// One playlist entry as it moves through the parser/filter/transformer pipeline.
#[derive(Debug, Clone, Default)]
pub struct IptvChannel {
    pub original_name: String,
    pub new_name: String,
    pub url: String,
    pub tags: IndexMap<String, String>,
}

impl IptvChannel {
    pub fn new(original_name: String) -> Self {
        IptvChannel {
            new_name: original_name.clone(),
            original_name,
            url: String::new(),
            tags: IndexMap::new(),
        }
    }

    pub fn sentinel() -> Self {
        IptvChannel::new(SENTINEL_NAME.to_string())
    }

    pub fn is_sentinel(&self) -> bool {
        self.original_name == SENTINEL_NAME
    }

    pub fn get_tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn set_tag(&mut self, name: &str, value: String) {
        self.tags.insert(name.to_string(), value);
    }

    pub fn delete_tag(&mut self, name: &str) {
        self.tags.shift_remove(name);
    }

    /// Renders the `#EXTINF`/url pair exactly as it is written to the output playlist.
    /// Tag order within the line is unspecified.
    pub fn to_m3u(&self) -> String {
        let mut line = String::from("#EXTINF:-1");
        for (name, value) in &self.tags {
            line.push_str(&format!(" {name}=\"{value}\""));
        }
        line.push(',');
        line.push_str(&self.new_name);
        format!("{line}\n{}\n", self.url)
    }
}

/// The destination playlist shared by every transformer stage. No channel is ever
/// shared between two playlists, and it must not be reallocated after the mapper
/// has recorded indices into it.
#[derive(Debug, Default)]
pub struct Playlist {
    channels: Vec<IptvChannel>,
    tvg_id_lookup: Option<HashSet<String>>,
}

impl Playlist {
    pub fn with_capacity(capacity: usize) -> Self {
        Playlist {
            channels: Vec::with_capacity(capacity),
            tvg_id_lookup: None,
        }
    }

    pub fn push(&mut self, channel: IptvChannel) {
        self.channels.push(channel);
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IptvChannel> {
        self.channels.iter()
    }

    pub fn as_slice(&self) -> &[IptvChannel] {
        &self.channels
    }

    pub fn as_mut_slice(&mut self) -> &mut [IptvChannel] {
        &mut self.channels
    }

    /// Builds the `tvg-id` lookup set on first call; later calls reuse it.
    pub fn is_tvg_id_in_playlist(&mut self, tvg_id: &str) -> bool {
        if self.tvg_id_lookup.is_none() {
            let lookup = self
                .channels
                .iter()
                .filter_map(|c| c.get_tag(TAG_TVG_ID).map(ToString::to_string))
                .collect();
            self.tvg_id_lookup = Some(lookup);
        }
        self.tvg_id_lookup.as_ref().is_some_and(|set| set.contains(tvg_id))
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a IptvChannel;
    type IntoIter = std::slice::Iter<'a, IptvChannel>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}
