use mongodb::bson::{doc, Document};
use serde::de::{Deserialize, Deserializer, Error};
use std::fmt::Display;
use std::str::FromStr;

/// `{ "$regex": <escaped>, "$options": "i" }`
pub fn contains_ci(value: &str) -> Document {
    doc! { "$regex": regex::escape(value.trim()), "$options": "i" }
}

/// 查询参数中的空串（`?status=`）按未传处理，其余按 `FromStr` 解析
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|e| D::Error::custom(format!("invalid value `{}`: {}", s, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq)]
    enum Color {
        Red,
    }

    impl FromStr for Color {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "red" => Ok(Color::Red),
                _ => Err("unknown color".into()),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "empty_as_none")]
        color: Option<Color>,
        #[serde(default, deserialize_with = "empty_as_none")]
        name: Option<String>,
        #[serde(default, deserialize_with = "empty_as_none")]
        page: Option<u64>,
    }

    fn parse(qs: &str) -> Result<Query, actix_web::error::QueryPayloadError> {
        actix_web::web::Query::<Query>::from_query(qs).map(|q| q.into_inner())
    }

    #[test]
    fn regex_input_is_escaped() {
        assert_eq!(contains_ci(" a+b "), doc! { "$regex": "a\\+b", "$options": "i" });
    }

    #[test]
    fn blank_query_values_are_none() {
        let q = parse("color=&name=%20&page=").unwrap();
        assert_eq!(q.color, None);
        assert_eq!(q.name, None);
        assert_eq!(q.page, None);
        let q = parse("color=red&name=x&page=3").unwrap();
        assert_eq!(q.color, Some(Color::Red));
        assert_eq!(q.name.as_deref(), Some("x"));
        assert_eq!(q.page, Some(3));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(parse("color=blue").is_err());
        assert!(parse("page=abc").is_err());
    }
}
