use std::fmt;

use serde::Deserialize;

/// 課題キーからプロジェクトキーを取り出す。
///
/// `ban-12`のように小文字で指定されても`BAN`を返す。
pub fn project_key(issue_key: &str) -> String {
    issue_key
        .trim()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// 課題キーを正規化する。
pub fn normalize_key(issue_key: &str) -> String {
    issue_key.trim().to_uppercase()
}

/// 課題。
#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
    pub key: String,
    pub project: String,
    pub title: String,
    pub description: String,
    pub worklogs: Vec<WorklogEntry>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.title)
    }
}

/// 課題に登録済みのworklog。
#[derive(Clone, Debug, PartialEq)]
pub struct WorklogEntry {
    pub author: String,
    pub time_spent: String,
    pub time_spent_seconds: i64,
    pub started: String,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// Tempoのアカウント。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: i64,
    pub key: String,
    pub name: String,
}

/// 作成する課題の内容。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub reporter: String,
    pub account_id: Option<i64>,
}

/// 作成された課題。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}
