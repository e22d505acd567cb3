use chrono::{Datelike, SecondsFormat, Utc};

/// 当前时间（Unix 毫秒）
pub fn now() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// ISO8601 形式的当前时间
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
