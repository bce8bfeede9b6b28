use crate::error::TrendsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Regions the collector and the sync helpers accept: the ten leading
/// countries by YouTube users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionCode {
    US,
    BR,
    RU,
    JP,
    IN,
    GB,
    DE,
    FR,
    CA,
    AU,
}

impl RegionCode {
    pub const ALL: [RegionCode; 10] = [
        RegionCode::US,
        RegionCode::BR,
        RegionCode::RU,
        RegionCode::JP,
        RegionCode::IN,
        RegionCode::GB,
        RegionCode::DE,
        RegionCode::FR,
        RegionCode::CA,
        RegionCode::AU,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionCode::US => "US",
            RegionCode::BR => "BR",
            RegionCode::RU => "RU",
            RegionCode::JP => "JP",
            RegionCode::IN => "IN",
            RegionCode::GB => "GB",
            RegionCode::DE => "DE",
            RegionCode::FR => "FR",
            RegionCode::CA => "CA",
            RegionCode::AU => "AU",
        }
    }
}

impl FromStr for RegionCode {
    type Err = TrendsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionCode::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = RegionCode::ALL.iter().map(|r| r.as_str()).collect();
                TrendsError::InvalidRegion(s.to_string(), allowed.join(", "))
            })
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub gl: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoCategory {
    pub id: String,
    pub title: String,
    pub assignable: bool,
}

/// One entry of a region's trending page.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingVideo {
    pub sequence: usize,
    pub snapshot_at: String,
    pub video_id: String,
    pub published_at: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail: String,
    pub category_id: String,
    pub description: String,
    pub tags: Option<Vec<String>>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub dislikes: Option<u64>,
    pub comments: Option<u64>,
    pub duration: String,
    pub region_restriction: Option<serde_json::Value>,
    pub topic_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub published_at: String,
    pub country: Option<String>,
    pub view_count: Option<u64>,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub topic_ids: Option<Vec<String>>,
}

/// A trending video left-joined with its channel, as stored in the daily CSV.
/// List and object columns hold JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub sequence: usize,
    #[serde(rename = "today")]
    pub snapshot_at: String,
    #[serde(rename = "videoIds")]
    pub video_id: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "titles")]
    pub title: String,
    #[serde(rename = "channelIds")]
    pub channel_id: String,
    #[serde(rename = "channelTitles")]
    pub channel_title: String,
    #[serde(rename = "thumbnails")]
    pub thumbnail: String,
    #[serde(rename = "categoryIds")]
    pub category_id: String,
    #[serde(rename = "descriptions")]
    pub description: String,
    pub tags: Option<String>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub dislikes: Option<u64>,
    pub comments: Option<u64>,
    #[serde(rename = "durations")]
    pub duration: String,
    #[serde(rename = "regionRestrictions")]
    pub region_restriction: Option<String>,
    #[serde(rename = "relevantTopicIds")]
    pub topic_ids: Option<String>,
    #[serde(rename = "channelPublishedAt")]
    pub channel_published_at: Option<String>,
    #[serde(rename = "channelCountry")]
    pub channel_country: Option<String>,
    #[serde(rename = "channelViewCount")]
    pub channel_view_count: Option<u64>,
    #[serde(rename = "channelSubscriberCount")]
    pub channel_subscriber_count: Option<u64>,
    #[serde(rename = "channelVideoCount")]
    pub channel_video_count: Option<u64>,
    #[serde(rename = "channelTopicIds")]
    pub channel_topic_ids: Option<String>,
}

impl TrendRow {
    pub fn from_parts(
        video: &TrendingVideo,
        channel: Option<&ChannelRecord>,
    ) -> Result<Self, TrendsError> {
        Ok(TrendRow {
            sequence: video.sequence,
            snapshot_at: video.snapshot_at.clone(),
            video_id: video.video_id.clone(),
            published_at: video.published_at.clone(),
            title: video.title.clone(),
            channel_id: video.channel_id.clone(),
            channel_title: video.channel_title.clone(),
            thumbnail: video.thumbnail.clone(),
            category_id: video.category_id.clone(),
            description: video.description.clone(),
            tags: video.tags.as_ref().map(serde_json::to_string).transpose()?,
            views: video.views,
            likes: video.likes,
            dislikes: video.dislikes,
            comments: video.comments,
            duration: video.duration.clone(),
            region_restriction: video
                .region_restriction
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            topic_ids: video.topic_ids.as_ref().map(serde_json::to_string).transpose()?,
            channel_published_at: channel.map(|c| c.published_at.clone()),
            channel_country: channel.and_then(|c| c.country.clone()),
            channel_view_count: channel.and_then(|c| c.view_count),
            channel_subscriber_count: channel.and_then(|c| c.subscriber_count),
            channel_video_count: channel.and_then(|c| c.video_count),
            channel_topic_ids: channel
                .and_then(|c| c.topic_ids.as_ref())
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

#[derive(Debug)]
pub struct CollectReport {
    pub region: RegionCode,
    pub output_path: PathBuf,
    pub rows: usize,
}

#[derive(Debug)]
pub struct SyncReport {
    pub region: RegionCode,
    pub local_dir: PathBuf,
    pub remote_matches: usize,
    pub already_present: usize,
    pub downloaded: Vec<String>,
}
