use chrono::{DateTime, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// worklogの`started`に利用する形式で日時を文字列にする。
///
/// Jiraはミリ秒とコロンなしのオフセットを要求する(例: `2024-01-01T09:00:00.000+0000`)。
pub fn to_jira_timestamp(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()
}


#[cfg(test)]
pub use mock_datetime::now;
