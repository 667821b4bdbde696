use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};

use crate::duration::format_duration;
use crate::issue::{Issue, WorklogEntry};

/// Consoleに課題や作業時間を表示するためのtrait。
pub trait ConsolePresenter {
    /// 課題の詳細を表示する。
    ///
    /// # Arguments
    ///
    /// * `issue` - 表示する課題
    fn show_issue(&mut self, issue: &Issue) -> Result<()>;

    /// 計測中の作業時間を表示する。
    fn show_elapsed(&mut self, elapsed: &Duration, running: bool) -> Result<()>;

    /// 任意のメッセージを1行表示する。
    fn show_message(&mut self, message: &str) -> Result<()>;
}

/// 課題をMarkdown形式で表示する。
pub struct ConsoleMarkdown<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdown<'a, W> {
    /// 新しい`ConsoleMarkdown`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdown<'a, W> {
    // 課題のタイトル、説明、worklogの一覧を表示する。
    fn show_issue(&mut self, issue: &Issue) -> Result<()> {
        writeln!(self.writer, "# {}", issue)
            .with_context(|| format!("Failed to write issue: {}", issue.key))?;
        if !issue.description.is_empty() {
            writeln!(self.writer, "\n{}", issue.description)
                .with_context(|| format!("Failed to write description: {}", issue.key))?;
        }
        if issue.worklogs.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "\n## Worklogs")
            .with_context(|| format!("Failed to write worklogs: {}", issue.key))?;
        let mut total = 0;
        for worklog in &issue.worklogs {
            writeln!(self.writer, "{}", worklog_line(worklog))
                .with_context(|| format!("Failed to write worklog: {:?}", worklog))?;
            total += worklog.time_spent_seconds;
        }
        writeln!(
            self.writer,
            "\nTotal: {}",
            format_duration(&Duration::seconds(total))
        )
        .with_context(|| format!("Failed to write total of worklogs: {}", issue.key))?;

        Ok(())
    }

    fn show_elapsed(&mut self, elapsed: &Duration, running: bool) -> Result<()> {
        let state = if running { "running" } else { "paused" };
        writeln!(
            self.writer,
            "{} ({}) [{}]",
            format_clock(elapsed),
            format_duration(elapsed),
            state
        )
        .context("Failed to write elapsed time")
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{}", message).context("Failed to write message")
    }
}

/// 作業時間を`HH:MM:SS`の形式にする。
pub fn format_clock(elapsed: &Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// worklogを1行の文字列にする。
///
/// 開始日時はLocalタイムゾーンで表示し、パースできない場合はそのまま表示する。
fn worklog_line(worklog: &WorklogEntry) -> String {
    let started = DateTime::parse_from_str(&worklog.started, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .map(|started| started.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| worklog.started.clone());
    let line = format!("- {} {} {}", started, worklog.author, worklog.time_spent);
    if worklog.comment.is_empty() {
        line
    } else {
        format!("{}: {}", line, worklog.comment)
    }
}
