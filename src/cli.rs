use clap::Parser;

use crate::package::LoadOptions;

#[derive(Parser, Debug)]
#[command(name = "sketchfile")]
#[command(version)]
#[command(about = "Inspect Sketch document packages from a path or HTTP URL", long_about = None)]
#[command(after_help = "Examples:\n  \
  sketchfile design.sketch              summary of every page\n  \
  sketchfile -l design.sketch           list pages with their layer counts\n  \
  sketchfile -p 'Page 1' design.sketch  dump one page as JSON\n  \
  sketchfile -t https://example.com/design.sketch   print text layers of a remote package")]
pub struct Cli {
    /// Package path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List pages
    #[arg(short = 'l')]
    pub list: bool,

    /// List archive entries as well and log progress
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print the document as JSON
    #[arg(short = 'd')]
    pub document: bool,

    /// Print the named page as JSON
    #[arg(short = 'p', value_name = "PAGE")]
    pub page: Option<String>,

    /// Print the text of every text layer
    #[arg(short = 't')]
    pub text: bool,

    /// Decode at most N pages at once
    #[arg(short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Skip CRC-32 checks of decoded entries
    #[arg(long = "no-crc")]
    pub no_crc: bool,

    /// Quiet mode, only errors are logged
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Default log filter, used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.is_quiet() {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        let defaults = LoadOptions::default();
        LoadOptions {
            concurrency: self.jobs.unwrap_or(defaults.concurrency).max(1),
            verify_crc: !self.no_crc,
        }
    }
}
