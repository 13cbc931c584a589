use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gazette_api_types::{AddCommentRequest, CommentListQuery};
use gazette_client::{ClientError, CommentBackend, CommentsClient};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gazette-cli", version, about = "Read and post Gazette comments")]
struct Cli {
    /// Base URL of the Gazette server.
    #[arg(
        long = "base-url",
        env = "GAZETTE_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Work with the comments of a post.
    #[command(subcommand)]
    Comments(CommentsCommand),
}

#[derive(Debug, Subcommand)]
enum CommentsCommand {
    /// Print the comments of a post as JSON.
    List(ListArgs),
    /// Post a comment.
    Add(AddArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    post_id: String,
    /// Return at most this many comments.
    #[arg(long)]
    limit: Option<u32>,
    /// Continue from a cursor returned by a previous page.
    #[arg(long)]
    cursor: Option<String>,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long = "post-id")]
    post_id: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    img: String,
    #[arg(long)]
    comment: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ListOutput<T> {
    items: T,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let client = CommentsClient::new(&cli.base_url)?;
    match cli.command {
        Command::Comments(CommentsCommand::List(args)) => {
            let query = CommentListQuery {
                limit: args.limit,
                cursor: args.cursor,
            };
            let page = client.list_page(&args.post_id, &query).await?;
            let output = ListOutput {
                items: page.items,
                next_cursor: page.next_cursor,
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
        Command::Comments(CommentsCommand::Add(args)) => {
            let response = client
                .add_comment(AddCommentRequest {
                    name: args.name,
                    post_id: args.post_id,
                    img: args.img,
                    comment: args.comment,
                })
                .await?;
            Ok(serde_json::to_string_pretty(&response)?)
        }
    }
}
