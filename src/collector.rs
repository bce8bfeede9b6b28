use crate::error::TrendsError;
use crate::types::{ChannelRecord, CollectReport, RegionCode, TrendRow, TrendingVideo};
use crate::youtube::YouTubeClient;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

pub struct Collector {
    client: YouTubeClient,
    output_dir: PathBuf,
    pause: Duration,
    max_results: u32,
}

impl Collector {
    pub fn new(client: YouTubeClient, output_dir: PathBuf, pause: Duration, max_results: u32) -> Self {
        Self {
            client,
            output_dir,
            pause,
            max_results,
        }
    }

    /// Collects every region in order. The first failure stops the run;
    /// files already written for earlier regions stay on disk.
    pub async fn collect_all(&self, regions: &[RegionCode]) -> Result<Vec<CollectReport>, TrendsError> {
        let mut reports = Vec::with_capacity(regions.len());
        for region in regions {
            reports.push(self.collect_region(*region).await?);
        }
        Ok(reports)
    }

    pub async fn collect_region(&self, region: RegionCode) -> Result<CollectReport, TrendsError> {
        let snapshot = Utc::now();
        info!("Collecting trends for {}", region);

        sleep(self.pause).await;
        let videos = self
            .client
            .trending_videos(region, self.max_results, snapshot)
            .await?;

        sleep(self.pause).await;
        let channel_ids: Vec<String> = videos.iter().map(|v| v.channel_id.clone()).collect();
        let channels = self
            .client
            .channel_features(&channel_ids, self.max_results)
            .await?;

        let rows = join_channels(&videos, &channels)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_path = self.output_dir.join(output_file_name(region, snapshot));
        write_csv(&output_path, &rows)?;
        info!("Wrote {} rows to {}", rows.len(), output_path.display());

        Ok(CollectReport {
            region,
            output_path,
            rows: rows.len(),
        })
    }
}

/// `{YYYYMMDD}_{REGION}.csv`
pub fn output_file_name(region: RegionCode, snapshot: DateTime<Utc>) -> String {
    format!("{}_{}.csv", snapshot.format("%Y%m%d"), region)
}

/// Left join of videos to channels on channel id. Each video yields exactly
/// one row, in input order.
pub fn join_channels(
    videos: &[TrendingVideo],
    channels: &[ChannelRecord],
) -> Result<Vec<TrendRow>, TrendsError> {
    let mut by_id: HashMap<&str, &ChannelRecord> = HashMap::with_capacity(channels.len());
    for channel in channels {
        by_id.entry(channel.channel_id.as_str()).or_insert(channel);
    }

    videos
        .iter()
        .map(|video| TrendRow::from_parts(video, by_id.get(video.channel_id.as_str()).copied()))
        .collect()
}

pub fn write_csv(path: &Path, rows: &[TrendRow]) -> Result<(), TrendsError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    if rows.is_empty() {
        // serde only emits the header alongside the first record
        wtr.write_record(HEADER)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub const HEADER: [&str; 24] = [
    "sequence",
    "today",
    "videoIds",
    "publishedAt",
    "titles",
    "channelIds",
    "channelTitles",
    "thumbnails",
    "categoryIds",
    "descriptions",
    "tags",
    "views",
    "likes",
    "dislikes",
    "comments",
    "durations",
    "regionRestrictions",
    "relevantTopicIds",
    "channelPublishedAt",
    "channelCountry",
    "channelViewCount",
    "channelSubscriberCount",
    "channelVideoCount",
    "channelTopicIds",
];
