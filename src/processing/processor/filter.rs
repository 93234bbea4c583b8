use crate::model::config::Config;
use crate::model::playlist::{IptvChannel, TAG_GROUP_TITLE};
use crate::processing::processor::mapper::ChannelsMapper;
use crate::processing::ring::RecordRing;

/// Consumes `input` until the sentinel, dropping channels by blocked group,
/// blocked channel-name substring, blocked URL, and allow-list rules, then
/// forwards survivors (and finally the sentinel) to `output`.
pub fn filter(input: &RecordRing<IptvChannel>, output: &RecordRing<IptvChannel>, cfg: &Config, mapper: &ChannelsMapper) {
    let mut read_seq = 0u64;
    loop {
        let published = input.wait_until_published(read_seq);
        for seq in read_seq..published {
            let channel = input.take(seq);
            if channel.is_sentinel() {
                input.advance_consumer(seq + 1);
                output.push(IptvChannel::sentinel());
                return;
            }
            if is_allowed(&channel, cfg, mapper) {
                output.push(channel);
            }
        }
        input.advance_consumer(published);
        read_seq = published;
    }
}

fn is_allowed(channel: &IptvChannel, cfg: &Config, mapper: &ChannelsMapper) -> bool {
    if let Some(group) = channel.get_tag(TAG_GROUP_TITLE) {
        if cfg.blocked_groups.contains(group) {
            return false;
        }
    }
    if cfg.blocked_channels.iter().any(|blocked| channel.original_name.contains(blocked.as_str())) {
        return false;
    }
    if cfg.blocked_urls.contains(&channel.url) {
        return false;
    }
    if cfg.channels_templates.is_empty() && cfg.allowed_groups.is_empty() {
        return true;
    }
    if let Some(group) = channel.get_tag(TAG_GROUP_TITLE) {
        if cfg.allowed_groups.contains(group) {
            return true;
        }
    }
    mapper.is_allowed_channel(&channel.original_name)
}
