use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::config::{Config, DEFAULT_ISSUE_TYPE};

/// 接続設定を保存するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[clap(long = "url", help = "Jira server, http:// is added when no scheme is given")]
    pub url: String,

    #[clap(long = "login")]
    pub login: String,

    #[clap(long = "password")]
    pub password: String,

    #[clap(long = "issue-type", help = "Issue type used by `issue create`")]
    pub issue_type: Option<String>,
}

/// `config`サブコマンドの処理を行う。
///
/// # Arguments
///
/// * `args` - `config`サブコマンドの引数
/// * `path` - 保存先の設定ファイル
pub fn config_command(args: ConfigArgs, path: &Path) -> Result<Config> {
    let config = Config {
        url: args.url,
        login: args.login,
        password: args.password,
        issue_type: args
            .issue_type
            .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
    };
    config
        .save(path)
        .with_context(|| format!("Failed to save config to {:?}", path))?;
    info!("Config saved to {:?}", path);

    Ok(config)
}
