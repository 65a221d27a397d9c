use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

use recipe_intake::{
    load_config, ImageInput, IntakeError, RecipeIntake, Staged, VideoInput,
};

#[derive(Parser)]
#[command(name = "recipe-intake")]
#[command(about = "Turn a recipe page, cookbook photo text, video transcript or pasted text into a reviewable draft")]
#[command(version)]
struct Cli {
    /// Name recorded as the draft's contributor
    #[arg(long, global = true, default_value = "")]
    contributor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a recipe web page
    Url {
        url: String,
    },
    /// Import pasted recipe text
    Text {
        /// File to read, or - for stdin
        file: String,
    },
    /// Import text recovered from a cookbook photo
    Image {
        /// File holding the recognised text
        #[arg(long)]
        text_file: String,

        /// ISO 639-1 code of the recognised text
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        cookbook: Option<String>,

        #[arg(long)]
        page: Option<String>,
    },
    /// Import a cooking video from its transcript
    Video {
        url: String,

        #[arg(long)]
        transcript_file: Option<String>,

        #[arg(long)]
        title: Option<String>,

        /// Stage a video-only reference when there is no transcript
        #[arg(long)]
        keep_link: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(staged) => {
            for warning in &staged.warnings {
                eprintln!("warning: {}", warning);
            }
            match serde_json::to_string_pretty(&staged.draft) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: could not serialize draft: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("{}: {}", e.kind(), e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Staged, IntakeError> {
    let config = load_config()?;
    let intake = RecipeIntake::from_config(&config)?;
    let contributor = cli.contributor.as_str();

    match cli.command {
        Command::Url { url } => intake.from_url(&url, contributor).await,
        Command::Text { file } => {
            let text = read_input(&file).await?;
            intake.from_text(&text, contributor).await
        }
        Command::Image {
            text_file,
            language,
            cookbook,
            page,
        } => {
            let input = ImageInput {
                text: read_input(&text_file).await?,
                detected_language: language,
                cookbook_name: cookbook,
                cookbook_page: page,
                image_url: None,
            };
            intake.from_image(&input, contributor).await
        }
        Command::Video {
            url,
            transcript_file,
            title,
            keep_link,
        } => {
            let transcript = match transcript_file {
                Some(path) => Some(read_input(&path).await?),
                None => None,
            };
            let input = VideoInput {
                url,
                title,
                transcript,
            };
            match intake.from_video(&input, contributor).await {
                Err(IntakeError::NoTranscript) if keep_link => {
                    warn!("No transcript for {}, staging a video-only reference", input.url);
                    intake.video_reference(&input, contributor, "no transcript available")
                }
                result => result,
            }
        }
    }
}

async fn read_input(path: &str) -> Result<String, IntakeError> {
    let result = if path == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map(|_| text)
    } else {
        tokio::fs::read_to_string(path).await
    };
    result.map_err(|e| IntakeError::InvalidSource(format!("cannot read {}: {}", path, e)))
}
