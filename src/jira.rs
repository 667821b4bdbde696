use anyhow::{Context, Result};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::issue::{Account, CreatedIssue, Issue, NewIssue, Project, WorklogEntry};
use crate::worklog::{SubmissionResult, WorklogPayload};

static SCHEME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("Could not compile scheme pattern"));

/// 課題管理サービスと通信するためのtrait。
#[allow(async_fn_in_trait)]
#[cfg_attr(test, automock)]
pub trait IssueTracker {
    /// 課題を取得する。
    async fn get_issue(&self, key: &str) -> Result<Issue>;

    /// 課題を作成する。
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    /// プロジェクトを取得する。
    async fn get_project(&self, key: &str) -> Result<Project>;

    /// プロジェクトに紐づくTempoのアカウントを取得する。
    async fn find_account(&self, project_id: &str) -> Result<Option<Account>>;

    /// 課題にworklogを登録する。
    async fn submit_worklog(
        &self,
        issue_key: &str,
        payload: &WorklogPayload,
    ) -> Result<SubmissionResult>;
}

/// Jira APIの課題をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
struct JiraIssueFields {
    summary: Option<String>,
    description: Option<String>,
    project: Project,
    worklog: Option<JiraWorklogs>,
}

#[derive(Debug, Deserialize)]
struct JiraWorklogs {
    worklogs: Vec<JiraWorklog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraWorklog {
    author: Option<JiraUser>,
    time_spent: String,
    time_spent_seconds: i64,
    started: String,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    name: String,
    display_name: Option<String>,
}

impl From<JiraIssue> for Issue {
    fn from(issue: JiraIssue) -> Self {
        let worklogs = issue
            .fields
            .worklog
            .map(|worklog| worklog.worklogs)
            .unwrap_or_default()
            .into_iter()
            .map(|worklog| WorklogEntry {
                author: worklog
                    .author
                    .map(|user| user.display_name.unwrap_or(user.name))
                    .unwrap_or_default(),
                time_spent: worklog.time_spent,
                time_spent_seconds: worklog.time_spent_seconds,
                started: worklog.started,
                comment: worklog.comment.unwrap_or_default(),
            })
            .collect();

        Issue {
            key: issue.key,
            project: issue.fields.project.key,
            title: issue.fields.summary.unwrap_or_default(),
            description: issue.fields.description.unwrap_or_default(),
            worklogs,
        }
    }
}

/// スキームのないURLに`http://`を付与し、末尾の`/`を取り除く。
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if SCHEME_PATTERN.is_match(url) {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// Jira APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = JiraClient::new(&config).unwrap();
/// let issue = client.get_issue("BAN-1").await.unwrap();
/// ```
pub struct JiraClient {
    client: Client,
    base_url: String,
    login: String,
    password: String,
}

impl JiraClient {
    /// 新しい`JiraClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `config` - 接続先と認証情報
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build http client")?;

        Ok(Self {
            client,
            base_url: normalize_url(&config.url),
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }

    /// 認証情報を付与したリクエストを作成する。
    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.login, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
    }

    /// リクエストを送信してレスポンスをデシリアライズする。
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Jira at {}", self.base_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

impl IssueTracker for JiraClient {
    async fn get_issue(&self, key: &str) -> Result<Issue> {
        debug!("Retrieving issue {}", key);
        let issue = self
            .send::<JiraIssue>(
                self.request(reqwest::Method::GET, &format!("/rest/api/2/issue/{}", key))
                    .query(&[("fields", "summary,description,project,worklog")]),
            )
            .await
            .with_context(|| format!("Failed to retrieve issue {}", key))?;

        Ok(issue.into())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let mut fields = json!({
            "project": {"key": issue.project_key},
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": {"name": issue.issue_type},
            "reporter": {"name": issue.reporter},
        });
        if let Some(account_id) = issue.account_id {
            fields["customfield_10009"] = json!(account_id.to_string());
        }

        let created = self
            .send::<CreatedIssue>(
                self.request(reqwest::Method::POST, "/rest/api/2/issue")
                    .json(&json!({ "fields": fields })),
            )
            .await
            .with_context(|| format!("Failed to create issue in {}", issue.project_key))?;
        info!("Issue {} created", created.key);

        Ok(created)
    }

    async fn get_project(&self, key: &str) -> Result<Project> {
        self.send(self.request(reqwest::Method::GET, &format!("/rest/api/2/project/{}", key)))
            .await
            .with_context(|| format!("Failed to retrieve project {}", key))
    }

    async fn find_account(&self, project_id: &str) -> Result<Option<Account>> {
        let accounts = self
            .send::<Vec<Account>>(self.request(
                reqwest::Method::GET,
                &format!("/rest/tempo-accounts/1/account/project/{}", project_id),
            ))
            .await
            .with_context(|| format!("Failed to retrieve accounts of project {}", project_id))?;
        debug!("length of accounts: {}", accounts.len());

        Ok(accounts.into_iter().next())
    }

    async fn submit_worklog(
        &self,
        issue_key: &str,
        payload: &WorklogPayload,
    ) -> Result<SubmissionResult> {
        self.send(
            self.request(
                reqwest::Method::POST,
                &format!("/rest/api/2/issue/{}/worklog", issue_key),
            )
            .json(payload),
        )
        .await
        .with_context(|| format!("Failed to submit worklog to {}", issue_key))
    }
}
