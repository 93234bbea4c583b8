use crate::model::config::{Config, DuplicatesLocation};
use crate::model::playlist::{Playlist, TAG_GROUP_TITLE, TAG_TVG_ID};
use crate::processing::processor::mapper::ChannelsMapper;

/// Renders the final `#EXTM3U` playlist: for each template in declaration
/// order, its priority pick (and, if `Inline`, its duplicate block); then, if
/// `Append`, every template's duplicate block; then unmatched channels from
/// each allowed group in declaration order.
pub fn render_playlist(cfg: &Config, mapper: &ChannelsMapper, playlist: &Playlist) -> String {
    let channels = playlist.as_slice();
    let mut out = String::from("#EXTM3U\n");

    for template_index in 0..mapper.template_count() {
        let instances = mapper.instances(template_index);
        let Some((&primary, duplicates)) = instances.split_first() else { continue };
        out.push_str(&channels[primary].to_m3u());
        if cfg.duplicates_location == DuplicatesLocation::Inline {
            append_duplicates(&mut out, channels, duplicates, cfg.num_duplicates);
        }
    }

    if cfg.duplicates_location == DuplicatesLocation::Append {
        for template_index in 0..mapper.template_count() {
            let instances = mapper.instances(template_index);
            if let Some((_, duplicates)) = instances.split_first() {
                append_duplicates(&mut out, channels, duplicates, cfg.num_duplicates);
            }
        }
    }

    for group in &cfg.allowed_groups {
        for (index, channel) in channels.iter().enumerate() {
            if channel.get_tag(TAG_GROUP_TITLE) == Some(group.as_str()) && !is_matched(mapper, index) {
                out.push_str(&channel.to_m3u());
            }
        }
    }

    out
}

fn append_duplicates(out: &mut String, channels: &[crate::model::playlist::IptvChannel], duplicates: &[usize], num_duplicates: usize) {
    for &index in duplicates.iter().take(num_duplicates) {
        let mut duplicate = channels[index].clone();
        duplicate.delete_tag(TAG_TVG_ID);
        out.push_str(&duplicate.to_m3u());
    }
}

fn is_matched(mapper: &ChannelsMapper, channel_index: usize) -> bool {
    (0..mapper.template_count()).any(|template_index| mapper.instances(template_index).contains(&channel_index))
}
