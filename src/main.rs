use clap::Parser;
use indicatif::ProgressBar;
use reelkix::{cli, cli_workflow, config, error, image_prep, report, uploader};
use cli::{Cli, Commands};
use config::Config;
use error::{ReelkixError, Result};
use reelkix_common::{Notification, Notifier, ResultsView, UploadOutcome};
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✖ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, output, max_size, api_url } => {
            println!("👟 reelkix - シューズ解析\n");

            // 1. 画像の準備
            println!("[1/3] 画像を準備中...");
            let api_url = config.resolve_api_url(api_url.as_deref())?;
            let upload = image_prep::load_image_file(&image, max_size.unwrap_or(config.max_image_size))?;
            println!("✔ {} ({} bytes, {})\n", upload.file_name, upload.len(), upload.mime_type);

            // 2. アップロード
            let uploader = uploader::HttpUploader::new(&api_url, Duration::from_secs(config.timeout_seconds))?;
            println!("[2/3] 解析APIへ送信中... ({})", uploader.endpoint());
            let workflow = cli_workflow(uploader);

            let spinner = ProgressBar::new_spinner();
            spinner.set_message("解析中...");
            spinner.enable_steady_tick(Duration::from_millis(120));

            let outcome = tokio::select! {
                outcome = workflow.upload_file(upload) => outcome,
                _ = tokio::signal::ctrl_c() => Err(reelkix_common::Error::Cancelled),
            };
            spinner.finish_and_clear();

            let result = match outcome {
                Ok(UploadOutcome::Done(result)) => result,
                // 失敗内容は通知済み
                Ok(UploadOutcome::Failed(_)) => return Ok(ExitCode::FAILURE),
                Ok(UploadOutcome::Stale) | Err(reelkix_common::Error::Cancelled) => {
                    workflow.teardown();
                    workflow.notifier().notify(Notification::info("解析を中断しました"));
                    return Ok(ExitCode::from(130));
                }
                Err(e) => return Err(e.into()),
            };
            println!("✔ 解析完了\n");

            // 3. 結果表示
            println!("[3/3] 結果");
            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            let view = ResultsView::from_session(workflow.session())
                .ok_or_else(|| ReelkixError::AnalysisFailed("解析結果が見つかりません".into()))?;
            print!("{}", report::render_results(&view));
        }

        Commands::Config { set_api_url, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ API URLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  API URL: {}", config.resolve_api_url(None).unwrap_or_else(|_| "未設定".into()));
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("SNSリンク:");
                println!("{}", report::render_social_links(&config.social_links));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
