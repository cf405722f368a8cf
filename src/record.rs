use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaKind {
    #[default]
    Unset,
    Video,
    ImageGallery,
}

impl MediaKind {
    pub fn code(self) -> u8 {
        match self {
            MediaKind::Unset => 0,
            MediaKind::Video => 1,
            MediaKind::ImageGallery => 2,
        }
    }
}

impl Serialize for MediaKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourcePath {
    Video(String),
    Images(Vec<String>),
}

impl Default for ResourcePath {
    fn default() -> Self {
        ResourcePath::Images(Vec::new())
    }
}

/// A resolved share link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub cover: String,
    pub video: Option<String>,
    pub resource_path: ResourcePath,
}

impl Record {
    pub fn gallery(title: &str, cover: &str, images: Vec<String>) -> Self {
        Self {
            kind: MediaKind::ImageGallery,
            title: title.to_string(),
            cover: cover.to_string(),
            video: None,
            resource_path: ResourcePath::Images(images),
        }
    }

    pub fn video(title: &str, cover: &str, playback_url: &str, resource_url: &str) -> Self {
        Self {
            kind: MediaKind::Video,
            title: title.to_string(),
            cover: cover.to_string(),
            video: Some(playback_url.to_string()),
            resource_path: ResourcePath::Video(resource_url.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.kind != MediaKind::Unset
    }
}

/// Success wrapper written by the CLI.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub data: T,
    pub message: &'static str,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: "success",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn video_record_serializes_with_numeric_kind() {
        let record = Record::video("t", "https://c", "https://play", "https://cdn/v.mp4");
        let value = serde_json::to_value(Envelope::success(record)).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "type": 1,
                    "title": "t",
                    "cover": "https://c",
                    "video": "https://play",
                    "resource_path": "https://cdn/v.mp4",
                },
                "message": "success",
            })
        );
    }

    #[test]
    fn gallery_record_serializes_image_list() {
        let record = Record::gallery("g", "https://c", vec!["https://a".into(), "https://b".into()]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], json!(2));
        assert_eq!(value["video"], json!(null));
        assert_eq!(value["resource_path"], json!(["https://a", "https://b"]));
    }

    #[test]
    fn default_record_is_unresolved() {
        assert!(!Record::default().is_resolved());
        assert_eq!(MediaKind::default().code(), 0);
    }
}
