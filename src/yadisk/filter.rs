//! 按文件类别过滤

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::RelayError;
use super::types::ResourceEntry;

/// 文件类别；除 All 外每个类别对应一个 MIME 前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    #[default]
    All,
    Documents,
    Images,
    Video,
    Audio,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        FileCategory::All,
        FileCategory::Documents,
        FileCategory::Images,
        FileCategory::Video,
        FileCategory::Audio,
    ];

    /// All 不做过滤，返回 None
    pub fn mime_prefix(self) -> Option<&'static str> {
        match self {
            FileCategory::All => None,
            FileCategory::Documents => Some("application/"),
            FileCategory::Images => Some("image/"),
            FileCategory::Video => Some("video/"),
            FileCategory::Audio => Some("audio/"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::All => "all",
            FileCategory::Documents => "documents",
            FileCategory::Images => "images",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
        }
    }
}

impl FromStr for FileCategory {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(FileCategory::All);
        }
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RelayError::Validation(format!("未知的文件类型: {}", s)))
    }
}

/// 过滤条目，保持原有顺序
///
/// 选了具体类别时，没有 mime_type 的条目（如文件夹）会被排除。
pub fn filter_entries(entries: Vec<ResourceEntry>, category: FileCategory) -> Vec<ResourceEntry> {
    let Some(prefix) = category.mime_prefix() else {
        return entries;
    };

    entries
        .into_iter()
        .filter(|e| e.mime_type.as_deref().is_some_and(|m| m.starts_with(prefix)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yadisk::types::ResourceType;

    fn file(name: &str, mime: Option<&str>) -> ResourceEntry {
        ResourceEntry {
            name: name.to_string(),
            kind: ResourceType::File,
            path: format!("/{}", name),
            mime_type: mime.map(str::to_string),
            download_url: Some(format!("https://dl.example/{}?filename={}", name, name)),
        }
    }

    fn folder(name: &str) -> ResourceEntry {
        ResourceEntry {
            name: name.to_string(),
            kind: ResourceType::Folder,
            path: format!("/{}", name),
            mime_type: None,
            download_url: None,
        }
    }

    fn sample() -> Vec<ResourceEntry> {
        vec![
            file("report.pdf", Some("application/pdf")),
            file("cat.png", Some("image/png")),
            folder("photos"),
            file("song.mp3", Some("audio/mpeg")),
            file("clip.mp4", Some("video/mp4")),
            file("unknown.bin", None),
            file("dog.jpg", Some("image/jpeg")),
        ]
    }

    #[test]
    fn test_all_returns_input_unchanged() {
        assert_eq!(filter_entries(sample(), FileCategory::All), sample());
        assert!(filter_entries(Vec::new(), FileCategory::All).is_empty());
    }

    #[test]
    fn test_specific_category_keeps_exactly_matching_entries() {
        for category in FileCategory::ALL.into_iter().skip(1) {
            let prefix = category.mime_prefix().unwrap();
            let expected: Vec<_> = sample()
                .into_iter()
                .filter(|e| e.mime_type.as_deref().is_some_and(|m| m.starts_with(prefix)))
                .collect();
            assert_eq!(filter_entries(sample(), category), expected, "{:?}", category);
        }
    }

    #[test]
    fn test_images_preserves_order_and_drops_folders() {
        let names: Vec<_> = filter_entries(sample(), FileCategory::Images)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["cat.png", "dog.jpg"]);
    }

    #[test]
    fn test_folder_listing_example() {
        let entries = vec![file("pic.png", Some("image/png")), folder("sub")];
        assert_eq!(filter_entries(entries.clone(), FileCategory::Images), vec![entries[0].clone()]);
        assert_eq!(filter_entries(entries.clone(), FileCategory::All), entries);
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("".parse::<FileCategory>().unwrap(), FileCategory::All);
        assert_eq!("Images".parse::<FileCategory>().unwrap(), FileCategory::Images);
        assert_eq!("audio".parse::<FileCategory>().unwrap(), FileCategory::Audio);
        assert!("spreadsheets".parse::<FileCategory>().is_err());
    }
}
