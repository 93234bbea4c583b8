use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::config::ChannelTemplate;
use crate::model::playlist::Playlist;

/// Maintains the three relations described by the data model: the
/// memoization cache from channel name to matched template, and (after the
/// pipeline drains) the reverse template-to-channel-indices relation used by
/// the ordering and rendering pass.
pub struct ChannelsMapper<'a> {
    templates: &'a [ChannelTemplate],
    name_to_template: Mutex<HashMap<String, Option<usize>>>,
    template_to_channels: Vec<Vec<usize>>,
}

impl<'a> ChannelsMapper<'a> {
    pub fn new(templates: &'a [ChannelTemplate]) -> Self {
        ChannelsMapper {
            templates,
            name_to_template: Mutex::new(HashMap::new()),
            template_to_channels: vec![Vec::new(); templates.len()],
        }
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn instances(&self, template_index: usize) -> &[usize] {
        &self.template_to_channels[template_index]
    }

    /// First match wins, in declaration order. Memoized per name; concurrent
    /// filter threads may race on the insert but the match function is pure
    /// so the first writer's result stands.
    pub fn map_channel_to_template(&self, original_name: &str) -> Option<usize> {
        {
            let cache = self.name_to_template.lock().unwrap();
            if let Some(cached) = cache.get(original_name) {
                return *cached;
            }
        }
        let name_lower = original_name.to_lowercase();
        let found = self.templates.iter().position(|template| template_matches(template, &name_lower));
        let mut cache = self.name_to_template.lock().unwrap();
        *cache.entry(original_name.to_string()).or_insert(found)
    }

    pub fn is_allowed_channel(&self, original_name: &str) -> bool {
        self.map_channel_to_template(original_name).is_some()
    }

    /// Walks the destination playlist once, single-threaded, recording which
    /// channels matched which template. Must run after the pipeline join.
    pub fn populate_maps(&mut self, playlist: &Playlist) {
        for index in &mut self.template_to_channels {
            index.clear();
        }
        for (index, channel) in playlist.iter().enumerate() {
            if let Some(template_index) = self.map_channel_to_template(&channel.original_name) {
                self.template_to_channels[template_index].push(index);
            }
        }
    }

    /// Sorts each template's instance list by quality priority: the index of
    /// the first `sort_qualities` entry occurring as a substring in
    /// `original_name`, with no match sorting last. Stable, so ties keep
    /// discovery order.
    pub fn order_by_sort_criteria(&mut self, playlist: &Playlist, sort_qualities: &[String]) {
        let channels = playlist.as_slice();
        for instances in &mut self.template_to_channels {
            instances.sort_by_key(|&index| {
                let name = &channels[index].original_name;
                sort_qualities.iter().position(|quality| name.contains(quality.as_str())).unwrap_or(sort_qualities.len())
            });
        }
    }
}

fn template_matches(template: &ChannelTemplate, name_lower: &str) -> bool {
    let is_included = template.include.iter().all(|s| contains_whole_token(name_lower, &s.to_lowercase()));
    let is_excluded = template.exclude.iter().any(|s| contains_whole_token(name_lower, &s.to_lowercase()));
    is_included && !is_excluded
}

/// A substring matches iff it occurs in `name_lower` with both flanking
/// positions non-alphanumeric; start/end of string count as non-alphanumeric.
/// This enforces whole-token matching: "bbc" matches "BBC News HD" but not
/// "abbct".
pub fn contains_whole_token(name_lower: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return false;
    }
    let name_chars: Vec<char> = name_lower.chars().collect();
    let needle_chars: Vec<char> = needle_lower.chars().collect();
    let needle_len = needle_chars.len();
    if needle_len > name_chars.len() {
        return false;
    }
    for start in 0..=(name_chars.len() - needle_len) {
        if name_chars[start..start + needle_len] == needle_chars[..] {
            let before_ok = start == 0 || !name_chars[start - 1].is_alphanumeric();
            let end = start + needle_len;
            let after_ok = end == name_chars.len() || !name_chars[end].is_alphanumeric();
            if before_ok && after_ok {
                return true;
            }
        }
    }
    false
}
