use crate::categories;
use crate::error::TrendsError;
use crate::sync::list_local_files;
use crate::types::TrendRow;
use csv::ReaderBuilder;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

/// Converts an ISO-8601 duration such as `PT1H2M3S` into seconds.
///
/// Hour, minute and second sections are each optional, and the day form
/// YouTube uses for long streams (`P1DT2H`, `P0D`) is accepted too. Anything
/// else, including a bare `PT`, yields `None`.
pub fn get_seconds(duration: &str) -> Option<u64> {
    let caps = DURATION.captures(duration.trim())?;
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }
    if duration.trim().ends_with('T') {
        return None;
    }

    let part = |i: usize, scale: u64| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(scale),
            None => Some(0),
        }
    };

    part(1, 86_400)?
        .checked_add(part(2, 3_600)?)?
        .checked_add(part(3, 60)?)?
        .checked_add(part(4, 1)?)
}

/// The emoji characters of `s`, in order.
pub fn extract_emojis(s: &str) -> String {
    let mut buf = [0u8; 4];
    s.chars()
        .filter(|c| emojis::get(c.encode_utf8(&mut buf)).is_some())
        .collect()
}

/// Reads every CSV of a region folder back into rows.
pub fn load_region(dir: &Path) -> Result<Vec<TrendRow>, TrendsError> {
    let mut rows = Vec::new();
    for name in list_local_files(dir, "csv")? {
        let mut reader = ReaderBuilder::new().from_path(dir.join(&name))?;
        let before = rows.len();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        debug!("Loaded {} rows from {}", rows.len() - before, name);
    }
    Ok(rows)
}

#[derive(Debug, PartialEq)]
pub struct RegionSummary {
    pub rows: usize,
    pub distinct_videos: usize,
    pub distinct_channels: usize,
    pub mean_duration_secs: Option<f64>,
    pub emoji_title_share: f64,
    pub top_categories: Vec<(String, usize)>,
}

pub fn summarize(rows: &[TrendRow], top: usize) -> RegionSummary {
    let distinct_videos = rows.iter().map(|r| r.video_id.as_str()).collect::<HashSet<_>>().len();
    let distinct_channels = rows.iter().map(|r| r.channel_id.as_str()).collect::<HashSet<_>>().len();

    let durations: Vec<u64> = rows.iter().filter_map(|r| get_seconds(&r.duration)).collect();
    let mean_duration_secs = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().map(|d| *d as f64).sum::<f64>() / durations.len() as f64)
    };

    let with_emoji = rows.iter().filter(|r| !extract_emojis(&r.title).is_empty()).count();
    let emoji_title_share = if rows.is_empty() {
        0.0
    } else {
        with_emoji as f64 / rows.len() as f64
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let name = categories::category_name_str(&row.category_id)
            .map(str::to_string)
            .unwrap_or_else(|| row.category_id.clone());
        *counts.entry(name).or_default() += 1;
    }
    let mut top_categories: Vec<(String, usize)> = counts.into_iter().collect();
    top_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_categories.truncate(top);

    RegionSummary {
        rows: rows.len(),
        distinct_videos,
        distinct_channels,
        mean_duration_secs,
        emoji_title_share,
        top_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::write_csv;

    #[test]
    fn durations_convert_to_seconds() {
        assert_eq!(get_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(get_seconds("PT45S"), Some(45));
        assert_eq!(get_seconds("PT2M"), Some(120));
        assert_eq!(get_seconds("PT1H"), Some(3600));
        assert_eq!(get_seconds("PT1H3S"), Some(3603));
        assert_eq!(get_seconds("P1DT2H"), Some(93_600));
        assert_eq!(get_seconds("P0D"), Some(0));
    }

    #[test]
    fn malformed_durations_are_none() {
        for input in ["garbage", "", "PT", "P", "PT1X", "1H2M", "PTM", "PT2S1M", "P1DT"] {
            assert_eq!(get_seconds(input), None, "{input:?}");
        }
    }

    #[test]
    fn emojis_are_extracted_in_order() {
        assert_eq!(extract_emojis("Hello 😀 world 🎉!"), "😀🎉");
        assert_eq!(extract_emojis("plain title"), "");
        assert_eq!(extract_emojis(""), "");
    }

    fn row(video: &str, channel: &str, category: &str, title: &str, duration: &str) -> TrendRow {
        TrendRow {
            sequence: 1,
            snapshot_at: "2023-01-01T00:00:00Z".into(),
            video_id: video.into(),
            published_at: "2022-12-31T00:00:00Z".into(),
            title: title.into(),
            channel_id: channel.into(),
            channel_title: String::new(),
            thumbnail: String::new(),
            category_id: category.into(),
            description: String::new(),
            tags: None,
            views: None,
            likes: None,
            dislikes: None,
            comments: None,
            duration: duration.into(),
            region_restriction: None,
            topic_ids: None,
            channel_published_at: None,
            channel_country: None,
            channel_view_count: None,
            channel_subscriber_count: None,
            channel_video_count: None,
            channel_topic_ids: None,
        }
    }

    #[test]
    fn summary_counts_categories_by_name() {
        let rows = vec![
            row("v1", "c1", "10", "song 🎵", "PT3M"),
            row("v2", "c1", "10", "another song", "PT5M"),
            row("v3", "c2", "20", "game", "broken"),
            row("v1", "c1", "10", "song 🎵", "PT3M"),
            row("v4", "c3", "99", "odd", "PT1M"),
        ];

        let summary = summarize(&rows, 2);

        assert_eq!(summary.rows, 5);
        assert_eq!(summary.distinct_videos, 4);
        assert_eq!(summary.distinct_channels, 3);
        assert_eq!(summary.mean_duration_secs, Some(180.0));
        assert!((summary.emoji_title_share - 0.4).abs() < 1e-9);
        assert_eq!(
            summary.top_categories,
            vec![("Music".to_string(), 3), ("99".to_string(), 1)]
        );
    }

    #[test]
    fn huge_durations_do_not_overflow_the_mean() {
        let huge = format!("PT{}S", u64::MAX);
        let rows = vec![row("v1", "c1", "10", "a", &huge), row("v2", "c1", "10", "b", &huge)];

        let mean = summarize(&rows, 1).mean_duration_secs.unwrap();
        assert!((mean - u64::MAX as f64).abs() / (u64::MAX as f64) < 1e-9);
    }

    #[test]
    fn empty_summary() {
        let summary = summarize(&[], 5);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.mean_duration_secs, None);
        assert_eq!(summary.emoji_title_share, 0.0);
        assert!(summary.top_categories.is_empty());
    }

    #[test]
    fn region_folder_loads_every_csv() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(&dir.path().join("20230101_US.csv"), &[row("v1", "c1", "10", "a", "PT1S")]).unwrap();
        write_csv(
            &dir.path().join("20230102_US.csv"),
            &[row("v2", "c1", "10", "b", "PT2S"), row("v3", "c2", "17", "c", "PT3S")],
        )
        .unwrap();
        std::fs::write(dir.path().join("readme.txt"), "skip").unwrap();

        let rows = load_region(dir.path()).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, ["v1", "v2", "v3"]);
    }
}
