mod cli;
mod commands;
mod error;
mod jpeg;
mod mcp;
mod page_range;
mod pdf;
mod qr;
mod tabular;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, QrCommand};
use pdf::backend::Protection;
use pdf::tools::{parse_hex_color, TextStamp, Watermark};
use qr::QrPayload;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins when set; otherwise everything at `default_level` and above.
fn env_filter(default_level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

fn init_tracing(default_level: tracing::Level) {
    // stdout carries converted data and the MCP protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Mcp => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    init_tracing(default_level);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::JsonToCsv {
            input,
            delimiter,
            output,
        } => {
            commands::json_to_csv::run(input.as_deref(), &delimiter, output.as_deref())?;
        }
        Commands::CsvToJson {
            input,
            delimiter,
            no_header,
            output,
        } => {
            commands::csv_to_json::run(
                input.as_deref(),
                &delimiter,
                !no_header,
                output.as_deref(),
            )?;
        }
        Commands::Pages { pages, count } => {
            commands::pages::run(&pages, count)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, &output)?;
        }
        Commands::Split {
            path,
            pages,
            output,
        } => {
            commands::split::run(&path, &pages, &output)?;
        }
        Commands::Rotate {
            path,
            angle,
            output,
        } => {
            commands::rotate::run(&path, angle, &output)?;
        }
        Commands::Watermark {
            path,
            text,
            size,
            opacity,
            color,
            output,
        } => {
            let mut watermark = Watermark::new(text);
            watermark.size = size;
            watermark.opacity = opacity;
            if let Some(color) = color {
                watermark.color = parse_hex_color(&color)?;
            }
            commands::watermark::run(&path, &watermark, &output)?;
        }
        Commands::NumberPages {
            path,
            format,
            output,
        } => {
            commands::number_pages::run(&path, &format, &output)?;
        }
        Commands::RemoveLastPage { path, output } => {
            commands::remove_last_page::run(&path, &output)?;
        }
        Commands::AddText {
            path,
            text,
            page,
            x,
            y,
            size,
            color,
            output,
        } => {
            let mut stamp = TextStamp::new(text);
            stamp.page = page;
            stamp.x = x;
            stamp.y = y;
            stamp.size = size;
            if let Some(color) = color {
                stamp.color = parse_hex_color(&color)?;
            }
            commands::add_text::run(&path, &stamp, &output)?;
        }
        Commands::Protect {
            path,
            password,
            owner_password,
            allow_print,
            allow_copy,
            allow_modify,
            output,
        } => {
            let mut protection = Protection::new(password);
            if let Some(owner_password) = owner_password {
                protection.owner_password = owner_password;
            }
            protection.allow_printing = allow_print;
            protection.allow_copying = allow_copy;
            protection.allow_modifying = allow_modify;
            commands::protect::run(&path, &protection, &output)?;
        }
        Commands::Unlock {
            path,
            password,
            output,
        } => {
            commands::unlock::run(&path, &password, &output)?;
        }
        Commands::JpgToPdf {
            inputs,
            layout,
            output,
        } => {
            commands::images_to_pdf::run(&inputs, layout, &output)?;
        }
        Commands::Qr { payload } => {
            let payload = match payload {
                QrCommand::Url { url } => QrPayload::Url(url),
                QrCommand::Text { text } => QrPayload::Text(text),
                QrCommand::Wifi {
                    ssid,
                    password,
                    security,
                } => QrPayload::Wifi {
                    ssid,
                    password,
                    security,
                },
            };
            commands::qr::run(&payload)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_overrides_default_level() {
        std::env::set_var("RUST_LOG", "debug");
        let overridden = env_filter(tracing::Level::WARN).max_level_hint();
        std::env::remove_var("RUST_LOG");
        assert_eq!(overridden, Some(LevelFilter::DEBUG));

        assert_eq!(
            env_filter(tracing::Level::WARN).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }
}
