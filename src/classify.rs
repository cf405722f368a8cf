use crate::payload::{PayloadItem, ScrapedPayload};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Gallery(Record),
    /// Needs the playback probe before it becomes a record.
    Video(VideoCandidate),
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub title: String,
    pub cover: String,
    /// Opaque playback URI; empty when the page did not carry one.
    pub play_uri: String,
    pub fallback_urls: Vec<String>,
}

/// Rules apply in order: a video-page entry with images, then a note-page
/// entry, then a plain video-page entry.
pub fn classify(payload: &ScrapedPayload) -> Classification {
    if let Some(item) = payload.video_items.first() {
        if !item.images.is_empty() {
            let images = image_urls(item);
            if images.is_empty() {
                return Classification::Unmatched;
            }
            let cover = item
                .video
                .cover
                .first()
                .or_else(|| images.first().map(String::as_str))
                .unwrap_or_default()
                .to_string();
            return Classification::Gallery(Record::gallery(&item.desc, &cover, images));
        }
    }

    if let Some(item) = payload.note_items.first() {
        let images = image_urls(item);
        let Some(cover) = item.images.first().and_then(|img| img.first()) else {
            // A note without a single image URL has nothing to show.
            return Classification::Unmatched;
        };
        return Classification::Gallery(Record::gallery(&item.desc, cover, images));
    }

    if let Some(item) = payload.video_items.first() {
        return Classification::Video(VideoCandidate {
            title: item.desc.clone(),
            cover: item.video.cover.first().unwrap_or_default().to_string(),
            play_uri: item.video.play.uri.trim().to_string(),
            fallback_urls: item
                .video
                .play
                .url_list
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }

    Classification::Unmatched
}

fn image_urls(item: &PayloadItem) -> Vec<String> {
    item.images
        .iter()
        .filter_map(|img| img.first())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{PlayAddr, UrlList, VideoRef};
    use crate::record::{MediaKind, ResourcePath};

    fn urls(list: &[&str]) -> UrlList {
        UrlList {
            url_list: list.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn item(desc: &str, images: Vec<UrlList>, video: VideoRef) -> PayloadItem {
        PayloadItem {
            desc: desc.to_string(),
            images,
            video,
        }
    }

    fn plain_video() -> VideoRef {
        VideoRef {
            play: PlayAddr {
                uri: "v0200".to_string(),
                url_list: vec!["https://cdn/a.mp4".to_string(), "https://cdn/b.mp4".to_string()],
            },
            cover: urls(&["https://cdn/cover.jpg"]),
        }
    }

    #[test]
    fn video_page_images_win_over_note_page() {
        let payload = ScrapedPayload {
            video_items: vec![item(
                "from video page",
                vec![urls(&["https://img/1a", "https://img/1b"]), urls(&["https://img/2a"])],
                plain_video(),
            )],
            note_items: vec![item("from note page", vec![urls(&["https://note/1"])], VideoRef::default())],
        };
        let Classification::Gallery(record) = classify(&payload) else {
            panic!("expected gallery");
        };
        assert_eq!(record.kind, MediaKind::ImageGallery);
        assert_eq!(record.title, "from video page");
        assert_eq!(record.cover, "https://cdn/cover.jpg");
        assert_eq!(
            record.resource_path,
            ResourcePath::Images(vec!["https://img/1a".to_string(), "https://img/2a".to_string()])
        );
    }

    #[test]
    fn video_page_images_without_urls_are_unmatched() {
        let payload = ScrapedPayload {
            video_items: vec![item(
                "blank images",
                vec![urls(&[]), urls(&["  "])],
                plain_video(),
            )],
            note_items: Vec::new(),
        };
        assert_eq!(classify(&payload), Classification::Unmatched);
    }

    #[test]
    fn note_page_gallery_uses_first_image_as_cover() {
        let payload = ScrapedPayload {
            video_items: Vec::new(),
            note_items: vec![item(
                "note",
                vec![urls(&["https://note/1"]), urls(&["https://note/2"])],
                VideoRef::default(),
            )],
        };
        let Classification::Gallery(record) = classify(&payload) else {
            panic!("expected gallery");
        };
        assert_eq!(record.cover, "https://note/1");
        assert_eq!(
            record.resource_path,
            ResourcePath::Images(vec!["https://note/1".to_string(), "https://note/2".to_string()])
        );
    }

    #[test]
    fn note_page_beats_plain_video_entry() {
        let payload = ScrapedPayload {
            video_items: vec![item("clip", Vec::new(), plain_video())],
            note_items: vec![item("note", vec![urls(&["https://note/1"])], VideoRef::default())],
        };
        assert!(matches!(classify(&payload), Classification::Gallery(r) if r.title == "note"));
    }

    #[test]
    fn plain_video_entry_becomes_candidate() {
        let payload = ScrapedPayload {
            video_items: vec![item("clip", Vec::new(), plain_video())],
            note_items: Vec::new(),
        };
        assert_eq!(
            classify(&payload),
            Classification::Video(VideoCandidate {
                title: "clip".to_string(),
                cover: "https://cdn/cover.jpg".to_string(),
                play_uri: "v0200".to_string(),
                fallback_urls: vec!["https://cdn/a.mp4".to_string(), "https://cdn/b.mp4".to_string()],
            })
        );
    }

    #[test]
    fn empty_payload_and_imageless_note_are_unmatched() {
        assert_eq!(classify(&ScrapedPayload::default()), Classification::Unmatched);
        let payload = ScrapedPayload {
            video_items: Vec::new(),
            note_items: vec![item("note", Vec::new(), VideoRef::default())],
        };
        assert_eq!(classify(&payload), Classification::Unmatched);
    }
}
