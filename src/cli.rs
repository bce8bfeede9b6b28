use crate::types::RegionCode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect and explore regional YouTube trends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch trending videos per region and write one CSV per region
    Collect {
        /// YouTube Data API key
        #[arg(long, env = "API_KEY", hide_env_values = true)]
        api_key: String,

        /// Regions to collect, comma separated
        #[arg(short, long, value_delimiter = ',', default_values_t = RegionCode::ALL)]
        regions: Vec<RegionCode>,

        /// Output directory for the CSV files
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,

        /// Maximum number of trending videos requested per region
        #[arg(short, long, default_value = "250")]
        max_results: u32,

        /// Pause before every API call, in seconds
        #[arg(short, long, default_value = "3")]
        pause_secs: u64,
    },

    /// List the regions known to the YouTube API
    Regions {
        #[arg(long, env = "API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// List the video categories the YouTube API serves for a region
    ApiCategories {
        #[arg(long, env = "API_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(short, long)]
        region: RegionCode,
    },

    /// List object names in a Cloud Storage bucket
    Blobs {
        #[arg(short, long, default_value = "yt-trends-mining")]
        bucket: String,

        /// Only list objects whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,

        /// Stop at this delimiter after the prefix, e.g. "/" for one folder level
        #[arg(short, long, requires = "prefix")]
        delimiter: Option<String>,
    },

    /// Download the region's CSVs that are not present locally yet
    Sync {
        /// Region code, e.g. US
        #[arg(short, long)]
        region: String,

        /// Cloud Storage bucket holding the collected CSVs
        #[arg(short, long, default_value = "yt-trends-mining")]
        bucket: String,

        /// Local data root; files land in <data-dir>/<region>/
        #[arg(short, long, default_value = "../data")]
        data_dir: PathBuf,
    },

    /// Print the total size of the files in a folder
    Size {
        #[arg(short, long, default_value = "../data")]
        path: PathBuf,

        #[arg(short, long, default_value = "csv")]
        extension: String,
    },

    /// Summarize the downloaded CSVs of a region
    Eda {
        #[arg(short, long)]
        region: RegionCode,

        #[arg(short, long, default_value = "../data")]
        data_dir: PathBuf,

        /// Number of categories to show
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Print the static category id to name mapping
    Categories,
}
