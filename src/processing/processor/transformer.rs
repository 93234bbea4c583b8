use std::sync::Mutex;

use crate::model::config::Config;
use crate::model::playlist::{IptvChannel, Playlist, TAG_GROUP_TITLE};
use crate::processing::processor::mapper::ChannelsMapper;
use crate::processing::ring::RecordRing;

/// Consumes `input` until the sentinel. For each channel: copies its
/// template's tags, deletes blocked tags, renames if matched, then appends to
/// the shared destination playlist under `playlist`'s mutex.
pub fn transform(input: &RecordRing<IptvChannel>, cfg: &Config, mapper: &ChannelsMapper, playlist: &Mutex<Playlist>) {
    let mut read_seq = 0u64;
    loop {
        let published = input.wait_until_published(read_seq);
        for seq in read_seq..published {
            let mut channel = input.take(seq);
            if channel.is_sentinel() {
                input.advance_consumer(seq + 1);
                return;
            }
            let template_index = mapper.map_channel_to_template(&channel.original_name);
            if let Some(index) = template_index {
                for (name, value) in &cfg.channels_templates[index].tags {
                    channel.set_tag(name, value.clone());
                }
            }
            for blocked in &cfg.blocked_tags {
                channel.delete_tag(blocked);
            }
            if let Some(index) = template_index {
                channel.new_name = cfg.channels_templates[index].effective_new_name().to_string();
            }
            playlist.lock().unwrap().push(channel);
        }
        input.advance_consumer(published);
        read_seq = published;
    }
}

/// Runs once, after every transformer thread has drained and joined:
/// populates the mapper's reverse relation, inherits `group-title` across
/// templates in declaration order, then orders each template's duplicate
/// instances by quality priority.
pub fn run_post_pipeline_pass(cfg: &Config, mapper: &mut ChannelsMapper, playlist: &mut Playlist) {
    mapper.populate_maps(playlist);
    copy_group_title(cfg, mapper, playlist);
    mapper.order_by_sort_criteria(playlist, &cfg.sort_qualities);
}

fn copy_group_title(cfg: &Config, mapper: &ChannelsMapper, playlist: &mut Playlist) {
    if !cfg.copy_group_title {
        return;
    }
    let mut previous_group_title: Option<String> = None;
    let effective_titles: Vec<Option<String>> = cfg
        .channels_templates
        .iter()
        .map(|template| {
            let own = template.tags.get(TAG_GROUP_TITLE).cloned();
            let effective = own.or_else(|| previous_group_title.clone());
            previous_group_title = effective.clone();
            effective
        })
        .collect();

    for (template_index, title) in effective_titles.into_iter().enumerate() {
        let Some(title) = title else { continue };
        for &channel_index in mapper.instances(template_index) {
            playlist.as_mut_slice()[channel_index].set_tag(TAG_GROUP_TITLE, title.clone());
        }
    }
}
