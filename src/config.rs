use std::{env, fs, path::Path, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "jiralog";

/// 課題作成時に利用する課題タイプの既定値。
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

/// Jiraへの接続設定。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Config {
    pub url: String,
    pub login: String,
    pub password: String,
    pub issue_type: String,
}

/// 設定ファイルの内容。全ての項目を省略できる。
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    url: Option<String>,
    login: Option<String>,
    password: Option<String>,
    issue_type: Option<String>,
}

/// 設定ファイルの既定の場所を返す。
pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME).join("config.toml"))
        .context("OS config directory could not be determined, use --config to set a path")
}

impl Config {
    /// 設定を読み込む。
    ///
    /// 設定ファイルの値よりも環境変数`JIRA_URL`, `JIRA_LOGIN`, `JIRA_PASSWORD`を優先する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス。`None`の場合は既定の場所を利用する
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_path()?,
        };
        let file = read_partial(&path)?;

        Self::merge(file, |name| env::var(name).ok())
    }

    /// 設定ファイルの値と環境変数を統合する。
    fn merge<F>(file: PartialConfig, env_var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, value: Option<String>| {
            env_var(name)
                .or(value)
                .filter(|value| !value.is_empty())
        };

        let url = pick("JIRA_URL", file.url).ok_or_else(|| anyhow!("url must be set"))?;
        let login = pick("JIRA_LOGIN", file.login).ok_or_else(|| anyhow!("login must be set"))?;
        let password =
            pick("JIRA_PASSWORD", file.password).ok_or_else(|| anyhow!("password must be set"))?;
        let issue_type = file
            .issue_type
            .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string());
        trace!("Config: url is {}, login is {}", url, login);

        Ok(Self {
            url,
            login,
            password,
            issue_type,
        })
    }

    /// 設定ファイルに保存する。親ディレクトリが存在しない場合は作成する。
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let contents = toml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, contents).with_context(|| format!("Failed to write config: {:?}", path))?;
        debug!("Config saved to {:?}", path);

        Ok(())
    }
}

/// 設定ファイルを読み込む。ファイルが存在しない場合は空の設定とする。
fn read_partial(path: &Path) -> Result<PartialConfig> {
    debug!("Reading configuration at path {:?}", path);
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {:?}", path)),
        Err(err) => {
            trace!(
                "Could not read path {:?} (assuming no config file set yet) {}",
                path,
                err
            );
            Ok(PartialConfig::default())
        }
    }
}
