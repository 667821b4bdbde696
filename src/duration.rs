use std::fmt;

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Jiraの1日の長さ(秒)。
///
/// 暦の1日(24時間)ではなく、稼働日としての8時間を1日として扱う。
/// `1d`は`24h`ではなく`8h`と等しいので、単位の取り違えに注意すること。
pub const WORKDAY_SECONDS: i64 = 8 * 3600;

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)d)? ?(?:(\d+)h)? ?(?:(\d+)m)? ?(?:(\d+)s)?$")
        .expect("Could not compile duration pattern")
});

/// 作業時間の変換で発生するエラー。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    /// 文字列が`1d 2h 3m 4s`の形式に一致しない。
    #[error("invalid duration format: {0:?}")]
    Format(String),
    /// 作業時間として扱えない値。
    #[error("unsupported elapsed value: {0}")]
    Unsupported(String),
}

/// 作業時間の文字列をパースする。
///
/// 各単位(`d`, `h`, `m`, `s`)は省略可能で、省略された単位は0として扱う。
/// ただし単位が1つもない空文字列は形式上は一致するが、入力ミスとしてFormatエラーにする。
/// 1日は[`WORKDAY_SECONDS`]として計算する。
/// 合計が`chrono::Duration`で表せない大きさの場合もFormatエラーになる。
///
/// # Arguments
///
/// * `s` - `2h 57m`のような作業時間の文字列
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let input = s.trim();
    let captures = DURATION_PATTERN
        .captures(input)
        .ok_or_else(|| DurationError::Format(s.to_string()))?;
    if captures.iter().skip(1).all(|unit| unit.is_none()) {
        return Err(DurationError::Format(s.to_string()));
    }

    let units = [WORKDAY_SECONDS, 3600, 60, 1];
    let mut total: i64 = 0;
    for (index, unit_seconds) in units.iter().enumerate() {
        let Some(value) = captures.get(index + 1) else {
            continue;
        };
        let seconds = value
            .as_str()
            .parse::<i64>()
            .ok()
            .and_then(|value| value.checked_mul(*unit_seconds))
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(|| DurationError::Format(s.to_string()))?;
        total = seconds;
    }

    Duration::try_seconds(total).ok_or_else(|| DurationError::Format(s.to_string()))
}

/// 作業時間を`1d 2h 3m`の形式に変換する。
///
/// 分未満の秒は切り捨てるため、[`parse_duration`]との往復で値が一致するとは限らない。
pub fn format_duration(duration: &Duration) -> String {
    WorkBreakdown::from(*duration).to_string()
}

/// 作業時間を日(8時間)・時・分に分解したもの。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkBreakdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl WorkBreakdown {
    /// 秒数から分解する。負の値は0として扱う。
    pub fn from_seconds(total_seconds: i64) -> Self {
        let total_seconds = total_seconds.max(0);
        let days = total_seconds / WORKDAY_SECONDS;
        let rem = total_seconds % WORKDAY_SECONDS;
        let hours = rem / 3600;
        let minutes = (rem % 3600) / 60;

        Self {
            days,
            hours,
            minutes,
        }
    }
}

impl From<Duration> for WorkBreakdown {
    fn from(duration: Duration) -> Self {
        Self::from_seconds(duration.num_seconds())
    }
}

impl fmt::Display for WorkBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [(self.days, 'd'), (self.hours, 'h'), (self.minutes, 'm')]
            .iter()
            .filter(|(value, _)| *value > 0)
            .map(|(value, unit)| format!("{}{}", value, unit))
            .collect();

        if parts.is_empty() {
            write!(f, "0m")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}
