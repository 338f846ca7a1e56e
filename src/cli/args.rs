//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Post media downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "postgrab",
    version,
    about = "Download media from a post url",
    long_about = "Download the images, videos and audio embedded in a social media post.\n\n\
                  The extractor is chosen from the post url; files are written to the output \
                  directory without ever overwriting existing ones.",
    arg_required_else_help = true
)]
pub struct Args {
    /// URL of the post to download.
    pub url: String,

    /// Directory to save media into. Defaults to the current directory.
    #[arg(short, long = "out")]
    pub out: Option<PathBuf>,

    /// Enable debug logging and list saved files.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings and errors; hide progress bars.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of concurrent downloads.
    #[arg(short = 'j', long = "parallel")]
    pub parallel: Option<usize>,

    /// Attempts per file, including the first one.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Path to configuration file.
    #[arg(short, long, env = "POSTGRAB_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.out {
            config.download.output_dir = Some(dir.clone());
        }

        if let Some(parallel) = self.parallel {
            config.download.max_parallel = parallel;
        }

        if let Some(retries) = self.retries {
            config.download.max_attempts = retries;
        }

        if self.quiet {
            config.download.show_progress = false;
        }
    }
}
