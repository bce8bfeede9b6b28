use crate::error::TrendsError;
use crate::types::{ChannelRecord, RegionCode, RegionInfo, TrendingVideo, VideoCategory};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Thin client over the YouTube Data API v3 endpoints the collector needs.
pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiRegion {
    snippet: RegionSnippet,
}

#[derive(Debug, Deserialize)]
struct RegionSnippet {
    gl: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCategory {
    id: String,
    snippet: CategorySnippet,
}

#[derive(Debug, Deserialize)]
struct CategorySnippet {
    title: String,
    assignable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiVideo {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
    content_details: VideoContentDetails,
    #[serde(default)]
    topic_details: TopicDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    published_at: String,
    title: String,
    channel_id: String,
    channel_title: String,
    thumbnails: Thumbnails,
    category_id: String,
    description: String,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Thumbnail,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    dislike_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoContentDetails {
    duration: String,
    region_restriction: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicDetails {
    relevant_topic_ids: Option<Vec<String>>,
    topic_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiChannel {
    id: String,
    snippet: ChannelSnippet,
    #[serde(default)]
    statistics: ChannelStatistics,
    #[serde(default)]
    topic_details: TopicDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    published_at: String,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    view_count: Option<String>,
    subscriber_count: Option<String>,
    video_count: Option<String>,
}

// Counts arrive as decimal strings.
fn parse_count(s: Option<&str>) -> Option<u64> {
    s.and_then(|s| s.parse::<u64>().ok())
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, TrendsError> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!("GET {} {:?}", url, query);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TrendsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.bytes().await?;
        let list: ListResponse<T> = serde_json::from_slice(&body)?;
        Ok(list.items)
    }

    pub async fn list_regions(&self) -> Result<Vec<RegionInfo>, TrendsError> {
        let items: Vec<ApiRegion> = self
            .get("i18nRegions", &[("part", "snippet".to_string())])
            .await?;

        Ok(items
            .into_iter()
            .map(|r| RegionInfo {
                gl: r.snippet.gl,
                name: r.snippet.name,
            })
            .collect())
    }

    pub async fn list_video_categories(
        &self,
        region: RegionCode,
    ) -> Result<Vec<VideoCategory>, TrendsError> {
        let items: Vec<ApiCategory> = self
            .get(
                "videoCategories",
                &[
                    ("part", "snippet".to_string()),
                    ("regionCode", region.to_string()),
                ],
            )
            .await?;

        Ok(items
            .into_iter()
            .map(|c| VideoCategory {
                id: c.id,
                title: c.snippet.title,
                assignable: c.snippet.assignable,
            })
            .collect())
    }

    /// Fetches the trending page of `region`. Rows are numbered from 1 in
    /// response order and carry `snapshot` as their collection time.
    pub async fn trending_videos(
        &self,
        region: RegionCode,
        max_results: u32,
        snapshot: DateTime<Utc>,
    ) -> Result<Vec<TrendingVideo>, TrendsError> {
        info!("Fetching trending videos for {}", region);
        let items: Vec<ApiVideo> = self
            .get(
                "videos",
                &[
                    (
                        "part",
                        "snippet,statistics,contentDetails,topicDetails".to_string(),
                    ),
                    ("chart", "mostPopular".to_string()),
                    ("regionCode", region.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;

        let snapshot_at = snapshot.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let videos: Vec<TrendingVideo> = items
            .into_iter()
            .enumerate()
            .map(|(i, v)| TrendingVideo {
                sequence: i + 1,
                snapshot_at: snapshot_at.clone(),
                video_id: v.id,
                published_at: v.snippet.published_at,
                title: v.snippet.title,
                channel_id: v.snippet.channel_id,
                channel_title: v.snippet.channel_title,
                thumbnail: v.snippet.thumbnails.default.url,
                category_id: v.snippet.category_id,
                description: v.snippet.description,
                tags: v.snippet.tags,
                views: parse_count(v.statistics.view_count.as_deref()),
                likes: parse_count(v.statistics.like_count.as_deref()),
                dislikes: parse_count(v.statistics.dislike_count.as_deref()),
                comments: parse_count(v.statistics.comment_count.as_deref()),
                duration: v.content_details.duration,
                region_restriction: v.content_details.region_restriction,
                topic_ids: v.topic_details.relevant_topic_ids,
            })
            .collect();

        info!("Received {} trending videos for {}", videos.len(), region);
        Ok(videos)
    }

    /// Fetches public statistics for the given channels. Duplicate ids are
    /// requested once.
    pub async fn channel_features(
        &self,
        channel_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<ChannelRecord>, TrendsError> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = channel_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        if unique.is_empty() {
            return Ok(Vec::new());
        }

        info!("Fetching statistics for {} channels", unique.len());
        let items: Vec<ApiChannel> = self
            .get(
                "channels",
                &[
                    ("id", unique.join(",")),
                    ("part", "snippet,statistics,topicDetails".to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;

        Ok(items
            .into_iter()
            .map(|c| ChannelRecord {
                channel_id: c.id,
                published_at: c.snippet.published_at,
                country: c.snippet.country,
                view_count: parse_count(c.statistics.view_count.as_deref()),
                subscriber_count: parse_count(c.statistics.subscriber_count.as_deref()),
                video_count: parse_count(c.statistics.video_count.as_deref()),
                topic_ids: c.topic_details.topic_ids,
            })
            .collect())
    }
}
