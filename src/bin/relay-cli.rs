use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Client for a running dream relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search dream lands
    Query {
        /// Dream address
        #[arg(long, conflicts_with_all = ["land_name", "recommend"])]
        id: Option<String>,
        /// Island name
        #[arg(long, conflicts_with = "recommend")]
        land_name: Option<String>,
        /// Recommended lands for a language
        #[arg(long, requires = "lang")]
        recommend: bool,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Download a file hosted on the origin
    Download {
        url: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List friend requests
    FriendRequests {
        #[arg(long, value_enum, default_value_t = FriendKind::Receive)]
        kind: FriendKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FriendKind {
    Receive,
    Send,
}

impl FriendKind {
    fn as_str(self) -> &'static str {
        match self {
            FriendKind::Receive => "receive",
            FriendKind::Send => "send",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let (res, output) = match cli.command {
        Commands::Query {
            id,
            land_name,
            recommend,
            lang,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(id) = id {
                query.push(("id", id));
            } else if let Some(name) = land_name {
                query.push(("land_name", name));
            } else if recommend {
                query.push(("recommend", String::new()));
                query.push(("lang", lang.unwrap_or_default()));
            } else {
                return Err("query needs one of --id, --land-name or --recommend".into());
            }
            let res = client
                .get(format!("{}/dream_query", base))
                .query(&query)
                .send()
                .await?;
            (res, None)
        }
        Commands::Download { url, output } => {
            let res = client
                .post(format!("{}/dream_download", base))
                .body(url)
                .send()
                .await?;
            (res, output)
        }
        Commands::FriendRequests { kind } => {
            let res = client
                .get(format!("{}/friend_requests", base))
                .query(&[("type", kind.as_str())])
                .send()
                .await?;
            (res, None)
        }
    };

    write_response(res, output).await
}

async fn write_response(res: reqwest::Response, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let body = res.bytes().await?;
    match output {
        Some(path) => {
            std::fs::write(&path, &body)?;
            eprintln!("Wrote {} bytes to {}", body.len(), path.display());
        }
        None => std::io::stdout().write_all(&body)?,
    }
    Ok(())
}
