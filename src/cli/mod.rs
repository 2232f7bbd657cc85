use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "video-processor",
    about = "Video Processor - Turn YouTube videos into summaries, study notes, Q&A and more",
    version,
    long_about = "An HTTP service that validates YouTube URLs, fetches their transcripts and generates text in several styles (summary, educational, balanced, Q&A, narrative) through an OpenAI-compatible API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (defaults to the configured host)
        #[arg(long, env = "VIDEO_PROCESSOR_HOST", value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long, env = "VIDEO_PROCESSOR_PORT", value_name = "PORT")]
        port: Option<u16>,

        /// OpenAI API key used by the processing engine
        #[arg(long, env = "OPENAI_API_KEY", value_name = "KEY", hide_env_values = true)]
        openai_api_key: Option<String>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },

    /// List supported processing styles
    Styles,
}
