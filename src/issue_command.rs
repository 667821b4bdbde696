use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::Config;
use crate::issue::{self, CreatedIssue, Issue, NewIssue};
use crate::jira::IssueTracker;

/// 課題を操作するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct IssueArgs {
    #[clap(subcommand)]
    pub action: IssueAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum IssueAction {
    /// Show an issue and its worklogs
    Show(ShowArgs),
    /// Create an issue
    Create(CreateArgs),
}

#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    #[clap(help = "Issue key such as BAN-12")]
    pub key: String,
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    #[clap(short = 'p', long = "project", help = "Project key of the new issue")]
    pub project: String,

    #[clap(short = 't', long = "title", help = "Summary of the new issue")]
    pub title: String,

    #[clap(
        short = 'd',
        long = "description",
        help = "Description of the new issue",
        default_value = ""
    )]
    pub description: String,
}

pub struct IssueCommand<'a, T: IssueTracker> {
    client: &'a T,
    config: &'a Config,
}

impl<'a, T: IssueTracker> IssueCommand<'a, T> {
    /// 新しい`IssueCommand`を返す。
    ///
    /// # Arguments
    /// * `client` - Jira APIと通信するためのリポジトリ
    /// * `config` - 報告者や課題タイプを決めるための設定
    pub fn new(client: &'a T, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// `issue show`サブコマンドの処理を行う。
    pub async fn show(&self, args: ShowArgs) -> Result<Issue> {
        let key = issue::normalize_key(&args.key);
        let issue = self
            .client
            .get_issue(&key)
            .await
            .with_context(|| format!("Failed to retrieve issue {}", key))?;
        info!("Issue {} retrieved with {} worklogs", issue.key, issue.worklogs.len());

        Ok(issue)
    }

    /// `issue create`サブコマンドの処理を行う。
    ///
    /// プロジェクトにTempoのアカウントがあれば課題に紐づける。
    pub async fn create(&self, args: CreateArgs) -> Result<CreatedIssue> {
        let project_key = issue::project_key(&args.project);
        let project = self
            .client
            .get_project(&project_key)
            .await
            .with_context(|| format!("Failed to retrieve project {}", project_key))?;
        let account = self
            .client
            .find_account(&project.id)
            .await
            .with_context(|| format!("Failed to retrieve account of {}", project.key))?;
        if account.is_none() {
            warn!("No account found for project {}", project.key);
        }

        let new_issue = NewIssue {
            project_key: project.key,
            summary: args.title,
            description: args.description,
            issue_type: self.config.issue_type.clone(),
            reporter: self.config.login.clone(),
            account_id: account.map(|account| account.id),
        };
        self.client
            .create_issue(&new_issue)
            .await
            .context("Failed to create issue")
    }
}
