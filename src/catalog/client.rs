use crate::config::Config;
use crate::error::ApiError;

use super::types::{
    to_chapter_summary, to_summary, AtHomeResponse, ChapterData, ChapterListResponse,
    ChapterPage, MangaDetail, MangaEntityResponse, MangaListResponse, MangaPage,
};

/// Chapters fetched per request when paging through a title's chapter list.
const CHAPTER_PAGE_LIMIT: u32 = 96;

/// Content ratings included by default.
const SAFE_RATINGS: [&str; 2] = ["safe", "suggestive"];
/// Content ratings for the nsfw category.
const NSFW_RATINGS: [&str; 2] = ["erotica", "pornographic"];

/// A catalog listing request.
#[derive(Debug, Clone)]
pub enum Listing {
    Search { query: String },
    Popular,
    Latest,
    Recent,
    Category(Category),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Manga,
    Manhwa,
    Nsfw,
}

impl Category {
    /// Parse from query parameter string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manga" => Some(Self::Manga),
            "manhwa" => Some(Self::Manhwa),
            "nsfw" => Some(Self::Nsfw),
            _ => None,
        }
    }
}

/// Client for the upstream catalog API.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    uploads_url: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("olliverse-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.catalog_url.clone(),
            uploads_url: config.uploads_url.clone(),
        })
    }

    /// Fetch one page of a listing and reshape it for the frontend.
    pub async fn list(
        &self,
        listing: &Listing,
        limit: u32,
        offset: u32,
    ) -> Result<MangaPage, ApiError> {
        let mut params: Vec<(&str, String)> = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("includes[]", "cover_art".to_string()),
            ("availableTranslatedLanguage[]", "en".to_string()),
        ];

        let ratings: &[&str] = match listing {
            Listing::Category(Category::Nsfw) => &NSFW_RATINGS,
            _ => &SAFE_RATINGS,
        };
        for rating in ratings {
            params.push(("contentRating[]", rating.to_string()));
        }

        match listing {
            Listing::Search { query } => {
                params.push(("title", query.clone()));
                params.push(("order[relevance]", "desc".to_string()));
            }
            Listing::Popular => params.push(("order[followedCount]", "desc".to_string())),
            Listing::Latest => params.push(("order[latestUploadedChapter]", "desc".to_string())),
            Listing::Recent => params.push(("order[createdAt]", "desc".to_string())),
            Listing::Category(category) => {
                match category {
                    Category::Manga => params.push(("originalLanguage[]", "ja".to_string())),
                    Category::Manhwa => params.push(("originalLanguage[]", "ko".to_string())),
                    Category::Nsfw => {}
                }
                params.push(("order[followedCount]", "desc".to_string()));
            }
        }

        let response: MangaListResponse = self
            .get_json(&format!("{}/manga", self.base_url), &params)
            .await?;

        Ok(MangaPage {
            results: response
                .data
                .iter()
                .map(|m| to_summary(m, &self.uploads_url))
                .collect(),
            total: response.total,
            has_next_page: (offset as u64) + (limit as u64) < response.total,
        })
    }

    /// Fetch a title's details plus its full English chapter list.
    pub async fn detail(&self, id: &str) -> Result<MangaDetail, ApiError> {
        let params = [
            ("includes[]", "cover_art"),
            ("includes[]", "author"),
            ("includes[]", "artist"),
        ];
        let response: MangaEntityResponse = self
            .get_json(&format!("{}/manga/{}", self.base_url, id), &params)
            .await?;

        let chapters = self.all_chapters(id).await?;

        let manga = response.data;
        let image = super::types::cover_file_name(&manga.relationships)
            .map(|f| super::types::cover_url(&self.uploads_url, &manga.id, f))
            .unwrap_or_default();
        Ok(MangaDetail {
            id: manga.id.clone(),
            title: super::types::preferred_title(&manga.attributes.title),
            alt_titles: manga
                .attributes
                .alt_titles
                .iter()
                .filter_map(|m| m.values().next().cloned())
                .collect(),
            genres: super::types::english_genres(&manga.attributes.tags),
            image,
            description: super::types::preferred_description(&manga.attributes.description),
            status: manga.attributes.status.clone(),
            year: manga.attributes.year,
            chapters: chapters.iter().map(to_chapter_summary).collect(),
        })
    }

    /// Resolve a chapter's page image URLs via the at-home server endpoint.
    pub async fn chapter_pages(&self, chapter_id: &str) -> Result<Vec<ChapterPage>, ApiError> {
        let response: AtHomeResponse = self
            .get_json(
                &format!("{}/at-home/server/{}", self.base_url, chapter_id),
                &[] as &[(&str, &str)],
            )
            .await?;

        Ok(response
            .chapter
            .data
            .iter()
            .enumerate()
            .map(|(i, filename)| ChapterPage {
                page: i as u32 + 1,
                img: format!(
                    "{}/data/{}/{}",
                    response.base_url, response.chapter.hash, filename
                ),
            })
            .collect())
    }

    /// Page through the chapter feed until the reported total is reached.
    /// An upstream error mid-way ends the loop with what was collected.
    async fn all_chapters(&self, manga_id: &str) -> Result<Vec<ChapterData>, ApiError> {
        let mut chapters = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let params: Vec<(&str, String)> = vec![
                ("manga", manga_id.to_string()),
                ("limit", CHAPTER_PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
                ("translatedLanguage[]", "en".to_string()),
                ("order[chapter]", "asc".to_string()),
                ("contentRating[]", "safe".to_string()),
                ("contentRating[]", "suggestive".to_string()),
                ("includes[]", "scanlation_group".to_string()),
            ];

            let response: ChapterListResponse = match self
                .get_json(&format!("{}/chapter", self.base_url), &params)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Chapter page fetch failed at offset {}: {}", offset, e);
                    break;
                }
            };

            let got = response.data.len();
            chapters.extend(response.data);
            offset += CHAPTER_PAGE_LIMIT;
            if got == 0 || offset as u64 >= response.total {
                break;
            }
        }

        Ok(chapters)
    }

    async fn get_json<T, Q>(&self, url: &str, params: &Q) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamStatus(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::UpstreamRequest(format!("Malformed upstream response: {}", e)))
    }
}
