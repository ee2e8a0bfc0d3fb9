use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelkix")]
#[command(about = "シューズ画像を解析APIに送り、ブランド・モデル・カラーウェイ・SKUを表示する", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をアップロードして解析結果を表示
    Analyze {
        /// 画像ファイルのパス (JPEG/PNG/WebP/GIF/BMP)
        #[arg(required = true)]
        image: PathBuf,

        /// 解析結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 長辺の上限px（超える場合は縮小、0で無効。省略時は設定値）
        #[arg(long)]
        max_size: Option<u32>,

        /// APIのベースURL（設定・環境変数より優先）
        #[arg(long)]
        api_url: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
