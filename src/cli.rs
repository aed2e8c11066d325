use std::path::PathBuf;

use clap::{Parser, Subcommand};

const EXAMPLES: &str = "\
Examples:
  $ shareio post ./document.pdf
  $ shareio post ./document.pdf --pass 1234
  $ shareio get 8081
  $ shareio get 8081 --pass 1234
  $ shareio get 8081 -o ./downloads/";

#[derive(Parser, Debug)]
#[command(name = "shareio", version)]
#[command(about = "Share files through a ShareIO service using short numeric codes", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload and share a file
    Post {
        /// Path to the file to share
        file: PathBuf,

        /// Password to protect the file
        #[arg(short, long = "pass", value_name = "PASSWORD")]
        pass: Option<String>,
    },

    /// Download a shared file
    Get {
        /// File code (port number) to download
        code: String,

        /// Password to unlock the file
        #[arg(short, long = "pass", value_name = "PASSWORD")]
        pass: Option<String>,

        /// Output directory (defaults to the current directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}
