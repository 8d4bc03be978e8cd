use anyhow::Result;
use clap::{Parser, Subcommand};
use filter_client::app::App;
use filter_client::models::Config;
use filter_client::upload::ImageSource;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "filter-client")]
#[command(about = "Apply an AI style filter to a photo")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a photo and print the URL of the filtered image.
    Generate {
        /// Path or file:// URI of the photo.
        #[arg(value_name = "IMAGE")]
        image: String,

        /// Name of the style filter, for example "Ghibli".
        #[arg(short, long, value_parser = parse_filter_arg)]
        filter: String,

        /// Push token to notify when the image is ready.
        #[arg(long)]
        push_token: Option<String>,
    },
    /// Register this device's push token with the backend.
    Register {
        #[arg(long)]
        push_token: Option<String>,
    },
}

fn parse_filter_arg(input: &str) -> std::result::Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err("Filter name must not be empty".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filter_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let cli_push_token = match &args.command {
        Command::Generate { push_token, .. } | Command::Register { push_token } => {
            push_token.clone()
        }
    };
    if cli_push_token.is_some() {
        config.push_token = cli_push_token;
    }

    let app = App::from_config(&config)?;

    let outcome = match args.command {
        Command::Generate { image, filter, .. } => app
            .generate(Some(ImageSource::from_uri(&image)), &filter)
            .await
            .map(|generated| println!("{}", generated.image_url)),
        Command::Register { .. } => app.register_device().await.map(|_| {
            info!("Registered device {}", app.device_id());
        }),
    };

    if let Err(e) = outcome {
        error!("Request failed: {}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_arg_trims() {
        assert_eq!(parse_filter_arg("  Ghibli ").unwrap(), "Ghibli");
    }

    #[test]
    fn test_parse_filter_arg_rejects_blank() {
        assert!(parse_filter_arg("   ").is_err());
    }

    #[test]
    fn test_cli_parses_generate() {
        let args = CliArgs::try_parse_from([
            "filter-client",
            "generate",
            "photo.jpg",
            "--filter",
            "Ghibli",
        ])
        .unwrap();
        match args.command {
            Command::Generate { image, filter, push_token } => {
                assert_eq!(image, "photo.jpg");
                assert_eq!(filter, "Ghibli");
                assert!(push_token.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
