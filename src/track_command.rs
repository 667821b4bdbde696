use std::io::BufRead;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::console::ConsolePresenter;
use crate::issue;
use crate::jira::IssueTracker;
use crate::worklog::{DurationTracker, ElapsedValue, SubmissionResult};

const HELP: &str = "[Enter] start/pause  [s] show  [c] clear  [u] upload and exit  [q] quit";

/// 作業時間を計測して登録するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct TrackArgs {
    #[clap(help = "Issue key such as BAN-12")]
    pub key: String,

    #[clap(short = 'c', long = "comment", default_value = "")]
    pub comment: String,

    #[clap(
        long = "spent",
        help = "Time already spent before tracking, as seconds or 1d 2h 3m 4s"
    )]
    pub spent: Option<ElapsedValue>,
}

/// 入力された1行に対応する操作。
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Toggle,
    Show,
    Clear,
    Upload,
    Quit,
    Help,
}

impl Action {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Toggle,
            "s" => Self::Show,
            "c" => Self::Clear,
            "u" => Self::Upload,
            "q" => Self::Quit,
            _ => Self::Help,
        }
    }
}

pub struct TrackCommand<'a, T: IssueTracker> {
    client: &'a T,
}

impl<'a, T: IssueTracker> TrackCommand<'a, T> {
    /// 新しい`TrackCommand`を返す。
    pub fn new(client: &'a T) -> Self {
        Self { client }
    }

    /// `track`サブコマンドの処理を行う。
    ///
    /// 計測を開始した状態で入力を1行ずつ読み、`u`で登録して終了する。
    /// `q`または入力の終端では登録せずに終了する。
    ///
    /// # Arguments
    ///
    /// * `args` - `track`サブコマンドの引数
    /// * `input` - 操作を読み込む入力
    /// * `presenter` - 状態を表示する出力
    pub async fn run<R: BufRead, P: ConsolePresenter>(
        &self,
        args: TrackArgs,
        input: R,
        presenter: &mut P,
    ) -> Result<Option<SubmissionResult>> {
        let key = issue::normalize_key(&args.key);
        let mut tracker = DurationTracker::new();
        if let Some(spent) = args.spent {
            tracker
                .set_elapsed(spent)
                .context("Failed to read time already spent")?;
        }

        presenter.show_message(HELP)?;
        tracker.toggle();
        presenter.show_message(&format!("Tracking {}", key))?;

        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            match Action::parse(&line) {
                Action::Toggle => {
                    tracker.toggle();
                    if let Some(since) = tracker.running_since() {
                        debug!("Resumed at {}", since);
                    }
                    presenter.show_elapsed(&tracker.elapsed(), tracker.is_running())?;
                }
                Action::Show => {
                    presenter.show_elapsed(&tracker.elapsed(), tracker.is_running())?;
                }
                Action::Clear => {
                    tracker.clear_elapsed();
                    presenter.show_elapsed(&tracker.elapsed(), tracker.is_running())?;
                }
                Action::Upload => {
                    if tracker.is_running() {
                        tracker.toggle();
                    }
                    let result = tracker.upload(self.client, &key, &args.comment).await?;
                    match &result {
                        Some(result) => presenter
                            .show_message(&format!("Logged {} on {}", result.time_spent, key))?,
                        None => presenter.show_message("Nothing to log")?,
                    }
                    return Ok(result);
                }
                Action::Quit => {
                    info!("Quit without logging on {}", key);
                    return Ok(None);
                }
                Action::Help => presenter.show_message(HELP)?,
            }
        }

        warn!("Input closed, nothing was logged on {}", key);
        Ok(None)
    }
}
