use anyhow::{Context, Result};
use log::warn;

use crate::issue;
use crate::jira::IssueTracker;
use crate::worklog::{DurationTracker, ElapsedValue, SubmissionResult};

/// 作業時間を直接登録するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct LogArgs {
    #[clap(help = "Issue key such as BAN-12")]
    pub key: String,

    #[clap(
        short = 't',
        long = "time",
        help = "Time spent as seconds or in the format 1d 2h 3m 4s (1d = 8h)"
    )]
    pub time: ElapsedValue,

    #[clap(short = 'c', long = "comment", default_value = "")]
    pub comment: String,
}

pub struct LogCommand<'a, T: IssueTracker> {
    client: &'a T,
}

impl<'a, T: IssueTracker> LogCommand<'a, T> {
    /// 新しい`LogCommand`を返す。
    pub fn new(client: &'a T) -> Self {
        Self { client }
    }

    /// `log`サブコマンドの処理を行う。
    ///
    /// 作業時間が0の場合は何も登録しない。
    pub async fn run(&self, args: LogArgs) -> Result<Option<SubmissionResult>> {
        let key = issue::normalize_key(&args.key);
        let mut tracker = DurationTracker::new();
        tracker
            .set_elapsed(args.time)
            .context("Failed to read time spent")?;

        let result = tracker.upload(self.client, &key, &args.comment).await?;
        if result.is_none() {
            warn!("Time spent is zero, nothing was logged on {}", key);
        }

        Ok(result)
    }
}
