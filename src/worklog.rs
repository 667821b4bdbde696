use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::datetime;
use crate::duration::{format_duration, parse_duration, DurationError};
use crate::jira::IssueTracker;

/// 作業時間として設定できる値。
#[derive(Debug, Clone, PartialEq)]
pub enum ElapsedValue {
    /// 秒数。
    Seconds(i64),
    /// `2h 57m`形式の文字列。
    Text(String),
    /// 時間間隔。
    Interval(Duration),
}

impl From<i64> for ElapsedValue {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<&str> for ElapsedValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ElapsedValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Duration> for ElapsedValue {
    fn from(interval: Duration) -> Self {
        Self::Interval(interval)
    }
}

/// コマンドライン引数から変換する。
///
/// 数字だけの場合は秒数、それ以外は作業時間の文字列として扱う。
impl FromStr for ElapsedValue {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse::<i64>()
                .map(Self::Seconds)
                .map_err(|_| DurationError::Format(s.to_string()));
        }

        parse_duration(s)?;
        Ok(Self::Text(s.to_string()))
    }
}

/// worklog登録時に送信する内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPayload {
    pub time_spent: String,
    pub started: String,
    pub comment: String,
}

/// worklog登録のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub id: String,
    pub time_spent: String,
    pub time_spent_seconds: i64,
}

/// 中断と再開を挟みながら作業時間を積算する。
///
/// 停止状態かつ作業時間0で作成し、`toggle`で開始と停止を切り替える。
#[derive(Debug, Clone)]
pub struct DurationTracker {
    accumulated: Duration,
    running_since: Option<DateTime<Utc>>,
}

impl Default for DurationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationTracker {
    /// 停止状態の新しい`DurationTracker`を返す。
    pub fn new() -> Self {
        Self {
            accumulated: Duration::zero(),
            running_since: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        self.running_since
    }

    /// 計測の開始と停止を切り替える。
    ///
    /// 停止中であれば現在時刻から計測を開始し、計測中であれば経過時間を積算して停止する。
    pub fn toggle(&mut self) {
        let now = datetime::now();
        match self.running_since.take() {
            Some(since) => {
                let run = (now - since).max(Duration::zero());
                self.accumulated = self.accumulated + run;
                debug!("Paused after {}s", run.num_seconds());
            }
            None => {
                self.running_since = Some(now);
                debug!("Started at {}", now);
            }
        }
    }

    /// 現在までの作業時間を返す。計測中の場合は進行中の時間も含める。
    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + (datetime::now() - since).max(Duration::zero()),
            None => self.accumulated,
        }
    }

    /// 積算済みの作業時間を設定する。
    ///
    /// 文字列の場合、1日は8時間として計算する。
    ///
    /// # Arguments
    ///
    /// * `value` - 秒数、`2h 57m`形式の文字列、または時間間隔
    pub fn set_elapsed(&mut self, value: impl Into<ElapsedValue>) -> Result<(), DurationError> {
        self.accumulated = match value.into() {
            ElapsedValue::Seconds(seconds) if seconds < 0 => {
                return Err(DurationError::Unsupported(format!("{} seconds", seconds)));
            }
            ElapsedValue::Seconds(seconds) => Duration::try_seconds(seconds).ok_or_else(|| {
                DurationError::Unsupported(format!("{} seconds is out of range", seconds))
            })?,
            ElapsedValue::Text(text) => parse_duration(&text)?,
            ElapsedValue::Interval(interval) if interval < Duration::zero() => {
                return Err(DurationError::Unsupported(format!(
                    "negative interval of {}s",
                    interval.num_seconds()
                )));
            }
            ElapsedValue::Interval(interval) => interval,
        };

        Ok(())
    }

    /// 積算済みの作業時間を0に戻す。計測状態は変更しない。
    pub fn clear_elapsed(&mut self) {
        self.accumulated = Duration::zero();
    }

    /// 作業時間をworklogとして登録する。
    ///
    /// 作業時間が0の場合はリクエストを送信せずに`None`を返す。
    /// 登録後も作業時間はリセットしないため、必要であれば呼び出し側で`clear_elapsed`すること。
    ///
    /// # Arguments
    ///
    /// * `client` - worklogを登録するリポジトリ
    /// * `issue_key` - 登録先の課題キー
    /// * `comment` - worklogのコメント
    pub async fn upload<T: IssueTracker>(
        &self,
        client: &T,
        issue_key: &str,
        comment: &str,
    ) -> Result<Option<SubmissionResult>> {
        let elapsed = self.elapsed();
        if elapsed <= Duration::zero() {
            info!("Nothing to log for {}", issue_key);
            return Ok(None);
        }

        let payload = WorklogPayload {
            time_spent: format_duration(&elapsed),
            started: datetime::to_jira_timestamp(&datetime::now()),
            comment: comment.to_string(),
        };
        info!("Logging {} on {}", payload.time_spent, issue_key);

        let result = client.submit_worklog(issue_key, &payload).await?;

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{DurationTracker, ElapsedValue, SubmissionResult};
    use crate::datetime::mock_datetime;
    use crate::duration::{DurationError, WorkBreakdown};
    use crate::jira::MockIssueTracker;

    /// 固定した時刻から計測を始める。
    fn start_clock() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    }

    fn dummy_result(time_spent: &str, seconds: i64) -> SubmissionResult {
        SubmissionResult {
            id: "10100".to_string(),
            time_spent: time_spent.to_string(),
            time_spent_seconds: seconds,
        }
    }

    #[test]
    fn test_new_tracker_is_paused_and_empty() {
        let tracker = DurationTracker::new();

        assert!(!tracker.is_running());
        assert_eq!(tracker.elapsed(), Duration::zero());
    }

    #[rstest]
    #[case(0)]
    #[case(59)]
    #[case(7020)]
    #[case(1_000_000)]
    fn test_set_elapsed_seconds(#[case] seconds: i64) {
        let mut tracker = DurationTracker::new();

        tracker.set_elapsed(seconds).unwrap();

        assert_eq!(tracker.elapsed(), Duration::seconds(seconds));
    }

    #[rstest]
    #[case::hours_and_minutes("2h 57m", 10620)]
    #[case::workday("1d", 28800)]
    #[case::missing_units_are_zero("5h", 18000)]
    fn test_set_elapsed_text(#[case] text: &str, #[case] seconds: i64) {
        let mut tracker = DurationTracker::new();

        tracker.set_elapsed(text).unwrap();

        assert_eq!(tracker.elapsed(), Duration::seconds(seconds));
    }

    #[test]
    fn test_set_elapsed_interval() {
        let mut tracker = DurationTracker::new();

        tracker.set_elapsed(Duration::minutes(42)).unwrap();

        assert_eq!(tracker.elapsed(), Duration::minutes(42));
    }

    #[test]
    fn test_set_elapsed_bogus_text_is_format_error() {
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed(60_i64).unwrap();

        let result = tracker.set_elapsed("bogus");

        assert_eq!(result, Err(DurationError::Format("bogus".to_string())));
        assert_eq!(tracker.elapsed(), Duration::seconds(60));
    }

    #[rstest]
    #[case::negative_seconds(ElapsedValue::Seconds(-1))]
    #[case::negative_interval(ElapsedValue::Interval(Duration::seconds(-30)))]
    #[case::out_of_range_seconds(ElapsedValue::Seconds(9_999_999_999_999_999))]
    fn test_set_elapsed_unsupported(#[case] value: ElapsedValue) {
        let mut tracker = DurationTracker::new();

        let result = tracker.set_elapsed(value);

        assert!(matches!(result, Err(DurationError::Unsupported(_))));
    }

    /// 開始直後は時間が経過していないので積算済みの時間のみになる。
    #[test]
    fn test_toggle_start_then_elapsed() {
        start_clock();
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed(600_i64).unwrap();

        tracker.toggle();

        assert!(tracker.is_running());
        assert_eq!(tracker.elapsed(), Duration::seconds(600));

        mock_datetime::advance_mock_time(Duration::seconds(90));
        assert_eq!(tracker.elapsed(), Duration::seconds(690));
    }

    #[test]
    fn test_toggle_start_then_pause_accumulates() {
        start_clock();
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed(600_i64).unwrap();

        tracker.toggle();
        mock_datetime::advance_mock_time(Duration::minutes(25));
        tracker.toggle();

        assert!(!tracker.is_running());
        assert_eq!(tracker.elapsed(), Duration::seconds(600 + 25 * 60));

        // 停止中は時間が経過しても増えない
        mock_datetime::advance_mock_time(Duration::hours(1));
        assert_eq!(tracker.elapsed(), Duration::seconds(600 + 25 * 60));
    }

    #[test]
    fn test_toggle_multiple_sessions() {
        start_clock();
        let mut tracker = DurationTracker::new();

        for minutes in [10, 20, 30] {
            tracker.toggle();
            mock_datetime::advance_mock_time(Duration::minutes(minutes));
            tracker.toggle();
            mock_datetime::advance_mock_time(Duration::minutes(5));
        }

        assert_eq!(tracker.elapsed(), Duration::minutes(60));
    }

    #[test]
    fn test_elapsed_does_not_change_state() {
        start_clock();
        let mut tracker = DurationTracker::new();
        tracker.toggle();
        let since = tracker.running_since();

        mock_datetime::advance_mock_time(Duration::seconds(5));
        let first = tracker.elapsed();
        let second = tracker.elapsed();

        assert_eq!(first, second);
        assert!(tracker.is_running());
        assert_eq!(tracker.running_since(), since);
    }

    #[test]
    fn test_clear_elapsed_keeps_running_state() {
        start_clock();
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed("1h").unwrap();
        tracker.toggle();
        mock_datetime::advance_mock_time(Duration::minutes(3));

        tracker.clear_elapsed();

        assert!(tracker.is_running());
        assert_eq!(tracker.elapsed(), Duration::minutes(3));
    }

    #[rstest]
    #[case::seconds("90", ElapsedValue::Seconds(90))]
    #[case::text("1h 30m", ElapsedValue::Text("1h 30m".to_string()))]
    fn test_elapsed_value_from_str(#[case] input: &str, #[case] expected: ElapsedValue) {
        assert_eq!(input.parse::<ElapsedValue>().unwrap(), expected);
    }

    /// 範囲外の秒数はコマンドライン引数としては読めるが、設定時にエラーになる。
    #[test]
    fn test_set_elapsed_out_of_range_from_str() {
        let mut tracker = DurationTracker::new();
        let value = "9999999999999999".parse::<ElapsedValue>().unwrap();

        let result = tracker.set_elapsed(value);

        assert!(matches!(result, Err(DurationError::Unsupported(_))));
        assert_eq!(tracker.elapsed(), Duration::zero());
    }

    /// 範囲外の文字列はFormatエラーになる。
    #[test]
    fn test_set_elapsed_out_of_range_text() {
        let mut tracker = DurationTracker::new();

        let result = tracker.set_elapsed("9999999999999999s");

        assert_eq!(
            result,
            Err(DurationError::Format("9999999999999999s".to_string()))
        );
    }

    #[test]
    fn test_elapsed_value_from_str_rejects_bogus() {
        assert!("1.5h".parse::<ElapsedValue>().is_err());
    }

    /// 作業時間が0の場合はリクエストを送信しない。
    #[tokio::test]
    async fn test_upload_zero_sends_nothing() {
        let mut client = MockIssueTracker::new();
        client.expect_submit_worklog().times(0);
        let tracker = DurationTracker::new();

        let result = tracker.upload(&client, "BAN-1", "nothing").await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_upload_submits_formatted_duration() {
        start_clock();
        let mut client = MockIssueTracker::new();
        client
            .expect_submit_worklog()
            .times(1)
            .withf(|key, payload| {
                key == "BAN-1"
                    && payload.time_spent == "1d 2h 57m"
                    && payload.started == "2024-01-01T09:00:00.000+0000"
                    && payload.comment == "review"
            })
            .returning(|_, _| Ok(dummy_result("1d 2h 57m", 39420)));
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed(28800_i64 + 10620 + 42).unwrap();

        let result = tracker.upload(&client, "BAN-1", "review").await.unwrap();

        assert_eq!(result, Some(dummy_result("1d 2h 57m", 39420)));
        // 登録後も作業時間は残る
        assert_eq!(tracker.elapsed(), Duration::seconds(28800 + 10620 + 42));
    }

    /// 送信した文字列は、作成に使った日・時・分の分解と一致する。
    #[tokio::test]
    async fn test_upload_time_spent_matches_breakdown() {
        let elapsed = Duration::seconds(3 * 28800 + 5 * 3600 + 7 * 60 + 11);
        let expected = WorkBreakdown::from(elapsed).to_string();
        let mut client = MockIssueTracker::new();
        client
            .expect_submit_worklog()
            .times(1)
            .withf(move |_, payload| payload.time_spent == expected)
            .returning(|_, payload| Ok(dummy_result(&payload.time_spent, 0)));
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed(elapsed).unwrap();

        let result = tracker.upload(&client, "BAN-2", "").await.unwrap();

        assert_eq!(result.unwrap().time_spent, "3d 5h 7m");
    }

    /// 送信に失敗しても作業時間は保持され、再送できる。
    #[tokio::test]
    async fn test_upload_error_keeps_state() {
        let mut client = MockIssueTracker::new();
        client
            .expect_submit_worklog()
            .times(1)
            .returning(|_, _| Err(anyhow!("connection refused")));
        let mut tracker = DurationTracker::new();
        tracker.set_elapsed("2h").unwrap();

        let result = tracker.upload(&client, "BAN-1", "retry me").await;

        assert_eq!(result.unwrap_err().to_string(), "connection refused");
        assert_eq!(tracker.elapsed(), Duration::hours(2));
    }
}
