use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---- Wire types (upstream catalog responses, unused fields ignored) ----

#[derive(Debug, Deserialize)]
pub struct MangaListResponse {
    pub data: Vec<MangaData>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct MangaEntityResponse {
    pub data: MangaData,
}

#[derive(Debug, Deserialize)]
pub struct MangaData {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    #[serde(default, rename = "altTitles")]
    pub alt_titles: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct Tag {
    pub attributes: TagAttributes,
}

#[derive(Debug, Deserialize)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipAttributes {
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChapterListResponse {
    #[serde(default)]
    pub data: Vec<ChapterData>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChapterData {
    pub id: String,
    pub attributes: ChapterAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChapterAttributes {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default, rename = "publishAt")]
    pub publish_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtHomeResponse {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
pub struct AtHomeChapter {
    pub hash: String,
    #[serde(default)]
    pub data: Vec<String>,
}

// ---- API types (what this server serves to the frontend) ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaSummary {
    pub id: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub genres: Vec<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaPage {
    pub results: Vec<MangaSummary>,
    pub total: u64,
    pub has_next_page: bool,
}

impl MangaPage {
    pub fn empty() -> Self {
        Self {
            results: vec![],
            total: 0,
            has_next_page: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub title: String,
    pub chapter: Option<String>,
    pub volume: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDetail {
    pub id: String,
    pub title: String,
    pub alt_titles: Vec<String>,
    pub genres: Vec<String>,
    pub image: String,
    pub description: String,
    pub status: Option<String>,
    pub year: Option<i32>,
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPage {
    pub page: u32,
    pub img: String,
}

// ---- Transforms ----

/// Preferred display title: English, then romanized Japanese/Korean,
/// then whatever is available.
pub fn preferred_title(titles: &BTreeMap<String, String>) -> String {
    for key in ["en", "ja-ro", "ko-ro"] {
        if let Some(t) = titles.get(key) {
            return t.clone();
        }
    }
    titles
        .values()
        .next()
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn preferred_description(descriptions: &BTreeMap<String, String>) -> String {
    descriptions
        .get("en")
        .or_else(|| descriptions.values().next())
        .cloned()
        .unwrap_or_default()
}

pub fn cover_file_name(relationships: &[Relationship]) -> Option<&str> {
    relationships
        .iter()
        .find(|r| r.kind == "cover_art")
        .and_then(|r| r.attributes.as_ref())
        .and_then(|a| a.file_name.as_deref())
}

pub fn cover_url(uploads_url: &str, manga_id: &str, file_name: &str) -> String {
    format!("{}/covers/{}/{}", uploads_url, manga_id, file_name)
}

pub fn english_genres(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .filter_map(|t| t.attributes.name.get("en").cloned())
        .collect()
}

pub fn to_summary(manga: &MangaData, uploads_url: &str) -> MangaSummary {
    let image = cover_file_name(&manga.relationships)
        .map(|f| cover_url(uploads_url, &manga.id, f))
        .unwrap_or_default();
    MangaSummary {
        id: manga.id.clone(),
        title: preferred_title(&manga.attributes.title),
        image,
        description: preferred_description(&manga.attributes.description),
        genres: english_genres(&manga.attributes.tags),
        status: manga.attributes.status.clone(),
    }
}

pub fn to_chapter_summary(chapter: &ChapterData) -> ChapterSummary {
    let number = chapter.attributes.chapter.clone();
    let title = chapter
        .attributes
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Chapter {}", number.as_deref().unwrap_or("?")));
    ChapterSummary {
        id: chapter.id.clone(),
        title,
        chapter: number,
        volume: chapter.attributes.volume.clone(),
        release_date: chapter.attributes.publish_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_title_prefers_english() {
        let t = titles(&[("ja-ro", "Shingeki"), ("en", "Attack"), ("de", "Angriff")]);
        assert_eq!(preferred_title(&t), "Attack");
    }

    #[test]
    fn test_title_falls_back_to_romanized_then_any() {
        let t = titles(&[("ja-ro", "Shingeki"), ("de", "Angriff")]);
        assert_eq!(preferred_title(&t), "Shingeki");
        let t = titles(&[("ko-ro", "Nano")]);
        assert_eq!(preferred_title(&t), "Nano");
        let t = titles(&[("fr", "Seulement")]);
        assert_eq!(preferred_title(&t), "Seulement");
        assert_eq!(preferred_title(&titles(&[])), "Unknown");
    }

    #[test]
    fn test_cover_url_layout() {
        assert_eq!(
            cover_url("https://uploads.example.org", "abc", "cover.jpg"),
            "https://uploads.example.org/covers/abc/cover.jpg"
        );
    }

    #[test]
    fn test_to_summary_from_wire_json() {
        let data: MangaData = serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "attributes": {
                "title": {"en": "Solo"},
                "description": {"en": "A hunter."},
                "tags": [
                    {"attributes": {"name": {"en": "Action", "ja": "アクション"}}},
                    {"attributes": {"name": {"ja": "名前のみ"}}}
                ],
                "status": "ongoing"
            },
            "relationships": [
                {"type": "author", "id": "a-1"},
                {"type": "cover_art", "id": "c-1", "attributes": {"fileName": "x.png"}}
            ]
        }))
        .unwrap();

        let summary = to_summary(&data, "https://uploads.example.org");
        assert_eq!(summary.id, "m-1");
        assert_eq!(summary.title, "Solo");
        assert_eq!(summary.image, "https://uploads.example.org/covers/m-1/x.png");
        assert_eq!(summary.description, "A hunter.");
        // Tags without an English name are dropped
        assert_eq!(summary.genres, vec!["Action"]);
        assert_eq!(summary.status.as_deref(), Some("ongoing"));
    }

    #[test]
    fn test_missing_cover_means_empty_image() {
        let data: MangaData = serde_json::from_value(serde_json::json!({
            "id": "m-2",
            "attributes": {"title": {"en": "Bare"}},
            "relationships": []
        }))
        .unwrap();
        assert_eq!(to_summary(&data, "https://u").image, "");
    }

    #[test]
    fn test_chapter_title_fallback() {
        let ch: ChapterData = serde_json::from_value(serde_json::json!({
            "id": "ch-1",
            "attributes": {"title": null, "chapter": "12", "volume": "2", "publishAt": "2024-01-01T00:00:00+00:00"}
        }))
        .unwrap();
        let summary = to_chapter_summary(&ch);
        assert_eq!(summary.title, "Chapter 12");
        assert_eq!(summary.chapter.as_deref(), Some("12"));

        let ch: ChapterData = serde_json::from_value(serde_json::json!({
            "id": "ch-2",
            "attributes": {}
        }))
        .unwrap();
        assert_eq!(to_chapter_summary(&ch).title, "Chapter ?");
    }
}
