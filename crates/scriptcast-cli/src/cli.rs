use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a video script into YouTube metadata, a voiceover preview and a video clip")]
pub struct Cli {
    /// Script file to read (defaults to stdin)
    #[arg(short = 's', long, global = true)]
    pub script: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the run
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate title, keywords and description as JSON
    Metadata,

    /// Generate a video clip and save it as MP4
    Video {
        /// Destination file
        #[arg(short = 'o', long, default_value = "scriptcast.mp4")]
        out: PathBuf,
    },

    /// Generate metadata and video concurrently
    All {
        #[arg(short = 'o', long, default_value = "scriptcast.mp4")]
        out: PathBuf,
    },

    /// List voices available for the voiceover preview
    Voices {
        /// Language family prefix
        #[arg(short = 'l', long, default_value = "en")]
        lang: String,
    },

    /// Speak the script aloud; Ctrl-C stops playback
    Speak {
        /// Voice identifier from `voices`
        #[arg(long)]
        voice: Option<String>,

        #[arg(short = 'l', long, default_value = "en")]
        lang: String,
    },
}

impl Command {
    /// Whether the subcommand calls the remote generative service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Command::Metadata | Command::Video { .. } | Command::All { .. })
    }

    /// Whether the subcommand consumes a script.
    pub fn needs_script(&self) -> bool {
        !matches!(self, Command::Voices { .. })
    }
}
