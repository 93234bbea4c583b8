use crate::model::playlist::IptvChannel;
use crate::processing::ring::{ByteRing, RecordRing, BYTE_SENTINEL};

enum State {
    WaitingForExtinf,
    WaitingForUrl,
}

/// Consumes `input` until the byte sentinel, emitting one [`IptvChannel`] per
/// `#EXTINF … \n URL \n` pair into `output`, then forwards the record sentinel.
pub fn consume_m3u(input: &ByteRing, output: &RecordRing<IptvChannel>) {
    let mut state = State::WaitingForExtinf;
    let mut current = IptvChannel::default();
    let mut line: Vec<u8> = Vec::new();
    let mut read_seq: u64 = 0;

    'outer: loop {
        let published = input.wait_until_published(read_seq);
        let mut seq = read_seq;
        while seq < published {
            let byte = input.read_byte(seq);
            if byte == BYTE_SENTINEL[0] {
                let next_seq = seq + 1;
                let next_published = if next_seq < published { published } else { input.wait_until_published(seq) };
                if next_seq < next_published && input.read_byte(next_seq) == BYTE_SENTINEL[1] {
                    input.advance_consumer(next_seq + 1);
                    read_seq = next_seq + 1;
                    break 'outer;
                }
            }
            if byte == b'\n' {
                process_line(&line, &mut state, &mut current, output);
                line.clear();
            } else {
                line.push(byte);
            }
            seq += 1;
        }
        input.advance_consumer(seq);
        read_seq = seq;
    }

    output.push(IptvChannel::sentinel());
}

fn process_line(line: &[u8], state: &mut State, current: &mut IptvChannel, output: &RecordRing<IptvChannel>) {
    let text = String::from_utf8_lossy(line);
    match state {
        State::WaitingForExtinf => {
            if let Some(rest) = text.strip_prefix("#EXTINF") {
                *current = parse_extinf(rest);
                *state = State::WaitingForUrl;
            } else if let Some(group) = text.strip_prefix("#EXTGRP:") {
                current.set_tag(crate::model::playlist::TAG_GROUP_TITLE, group.trim().to_string());
            }
        }
        State::WaitingForUrl => {
            let trimmed = text.trim();
            if trimmed.starts_with("http") {
                current.url = trimmed.to_string();
                output.push(std::mem::take(current));
                *state = State::WaitingForExtinf;
            } else if text.starts_with("#EXTINF") {
                // duplicate #EXTINF before a URL was seen: overwrite the in-flight channel
                *current = parse_extinf(text.strip_prefix("#EXTINF").unwrap_or(""));
            }
        }
    }
}

/// Parses the body of an `#EXTINF:` line (everything after the literal prefix).
/// The display name is the substring after the last comma that occurs after
/// the last `=`; everything before that is `key=value` attribute pairs.
fn parse_extinf(rest: &str) -> IptvChannel {
    let content = rest.strip_prefix(':').unwrap_or(rest);
    let last_eq = content.rfind('=');
    let comma_search_start = last_eq.unwrap_or(0);
    let last_comma = content[comma_search_start..].rfind(',').map(|pos| pos + comma_search_start);

    let (attrs_part, name) = match last_comma {
        Some(pos) => (&content[..pos], content[pos + 1..].to_string()),
        None => (content, String::new()),
    };

    let mut channel = IptvChannel::new(name);
    for (key, value) in parse_key_value_pairs(attrs_part) {
        channel.set_tag(&key, value);
    }
    channel
}

/// Hand-rolled `key="value"`/`key=value` scanner; skips any leading token
/// without an `=` (the `-1` duration field).
fn parse_key_value_pairs(input: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = input.chars().collect();
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let token_start = i;
        while i < chars.len() && chars[i] != '=' && !chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() || chars[i] != '=' {
            continue;
        }
        let key: String = chars[token_start..i].iter().collect();
        i += 1;
        let value = if i < chars.len() && chars[i] == '"' {
            i += 1;
            let value_start = i;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            let value: String = chars[value_start..i].iter().collect();
            if i < chars.len() {
                i += 1;
            }
            value
        } else {
            let value_start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            chars[value_start..i].iter().collect()
        };
        if !key.is_empty() {
            pairs.push((key, value));
        }
    }
    pairs
}
