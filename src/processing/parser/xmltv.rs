use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::playlist::Playlist;
use crate::pefti_error::{PeftiError, PeftiErrorKind};

/// XML declaration, DOCTYPE, and root tag that precede every copied element.
const HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE tv SYSTEM \"xmltv.dtd\">\n<tv generator-info-name=\"pefti\">";

/// Builds the consolidated EPG from the raw XMLTV documents of every EPG
/// source: each document is parsed twice, once to copy matching `<channel>`
/// elements and once for `<programme>` elements.
pub fn build_epg(source_documents: &[String], playlist: &mut Playlist) -> Result<String, PeftiError> {
    let mut out = String::from(HEADER);
    for document in source_documents {
        rewrite(document, "channel", "id", playlist, &mut out)?;
        rewrite(document, "programme", "channel", playlist, &mut out)?;
    }
    out.push_str("\n</tv>\n");
    Ok(out)
}

/// Copies every `parent_node` element (and its subtree) whose `id_attr`
/// attribute is a known `tvg-id` in `playlist`. Three-state machine:
/// waiting for a matching parent, inside a copied subtree, or (implicitly,
/// via the depth counter) back outside once the parent's end tag is seen.
///
/// `accepting_text` tracks whether we are directly inside the innermost
/// currently-open element with no nested child opened yet (the original's
/// "InsideNode" state) as opposed to having already seen and closed a child
/// (its "OutsideNode" state). Text only ever survives if it sits directly
/// between an element's start and its own end tag with no intervening
/// child; a nested start discards whatever was pending (mirroring the
/// original's unconditional `m_characters.clear()` on every start tag), and
/// once a child has closed, further text before the parent's end tag is
/// dropped outright rather than accumulated and discarded later.
fn rewrite(content: &str, parent_node: &str, id_attr: &str, playlist: &mut Playlist, out: &mut String) -> Result<(), PeftiError> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();
    let mut depth: i32 = 0;
    let mut pending_text = String::new();
    let mut accepting_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if depth == 0 {
                    if name == parent_node && matches_known_tvg_id(&e, id_attr, playlist) {
                        out.push_str(&open_tag(&e)?);
                        depth = 1;
                        pending_text.clear();
                        accepting_text = true;
                    }
                } else {
                    pending_text.clear();
                    out.push_str(&open_tag(&e)?);
                    depth += 1;
                    accepting_text = true;
                }
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if depth == 0 {
                    if name == parent_node && matches_known_tvg_id(&e, id_attr, playlist) {
                        out.push_str(&empty_element_as_pair(&e)?);
                    }
                } else {
                    pending_text.clear();
                    out.push_str(&empty_element_as_pair(&e)?);
                    accepting_text = false;
                }
            }
            Ok(Event::Text(t)) => {
                if depth > 0 && accepting_text {
                    pending_text.push_str(&t.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(e)) => {
                if depth > 0 {
                    if accepting_text {
                        let cleaned = clean_text(&pending_text);
                        if !cleaned.trim().is_empty() {
                            out.push_str(&quick_xml::escape::escape(&cleaned));
                        }
                    }
                    pending_text.clear();
                    out.push_str(&format!("</{}>", local_name_bytes(&e)));
                    depth -= 1;
                    accepting_text = false;
                }
            }
            Err(err) => return Err(PeftiError::new(PeftiErrorKind::Parse, err.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Discards purely-whitespace runs but keeps single internal spaces, matching
/// the source document's formatting-agnostic text content.
fn clean_text(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() || *c == ' ').collect()
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn local_name_bytes(e: &quick_xml::events::BytesEnd) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn matches_known_tvg_id(e: &BytesStart, attr_name: &str, playlist: &mut Playlist) -> bool {
    attribute_value(e, attr_name).is_some_and(|id| playlist.is_tvg_id_in_playlist(&id))
}

fn attribute_value(e: &BytesStart, attr_name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == attr_name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn open_tag(e: &BytesStart) -> Result<String, PeftiError> {
    let mut tag = format!("<{}", local_name(e));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PeftiError::new(PeftiErrorKind::Parse, err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        tag.push_str(&format!(" {key}=\"{value}\""));
    }
    tag.push('>');
    Ok(tag)
}

fn empty_element_as_pair(e: &BytesStart) -> Result<String, PeftiError> {
    let mut tag = open_tag(e)?;
    tag.pop();
    Ok(format!("{tag}></{}>", local_name(e)))
}
