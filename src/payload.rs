use crate::{EngineError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Server-rendered state pulled from one page, reduced to the two item lists
/// the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedPayload {
    pub video_items: Vec<PayloadItem>,
    pub note_items: Vec<PayloadItem>,
}

impl ScrapedPayload {
    pub fn is_empty(&self) -> bool {
        self.video_items.is_empty() && self.note_items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayloadItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<UrlList>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video: VideoRef,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoRef {
    #[serde(default, rename = "play_addr", deserialize_with = "null_as_default")]
    pub play: PlayAddr,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover: UrlList,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayAddr {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_list: Vec<String>,
}

/// An image or cover: the same asset at several URLs, preferred first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UrlList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_list: Vec<String>,
}

impl UrlList {
    pub fn first(&self) -> Option<&str> {
        self.url_list
            .iter()
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text between the first `{` and the last `}` of a script body.
pub fn json_blob(script: &str) -> Option<&str> {
    let start = script.find('{')?;
    let end = script.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&script[start..=end])
}

/// Read the item lists at the profile's pointers. Missing lists are empty;
/// lists that exist but do not have the item shape are an error.
pub fn payload_from_value(
    value: &Value,
    video_pointer: &str,
    note_pointer: &str,
) -> Result<ScrapedPayload> {
    Ok(ScrapedPayload {
        video_items: items_at(value, video_pointer)?,
        note_items: items_at(value, note_pointer)?,
    })
}

fn items_at(root: &Value, pointer: &str) -> Result<Vec<PayloadItem>> {
    match root.pointer(pointer) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => Vec::<PayloadItem>::deserialize(list).map_err(EngineError::Json),
    }
}
