//! Flat text encoding for list-valued columns.
//!
//! Genres and countries are stored as JSON arrays in a single `TEXT`
//! column. `decode(Some(&encode(xs))) == xs` holds for every list,
//! including the empty one.

use serde_json::Value;

use crate::{Error, Result};

/// Encodes an ordered list of strings as a JSON array.
#[must_use]
pub fn encode(list: &[String]) -> String {
    Value::from(list).to_string()
}

/// Decodes a column written by [`encode`].
///
/// `None` and the empty string decode to an empty list.
///
/// # Errors
///
/// Returns `Error::MalformedCacheData` if the text is not a JSON array of
/// strings.
pub fn decode(text: Option<&str>) -> Result<Vec<String>> {
    match text {
        None => Ok(Vec::new()),
        Some(text) if text.is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| Error::MalformedCacheData(format!("{e}: {text:?}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_is_json_array() {
        let list = vec!["драма".to_string(), "comedy \"noir\"".to_string()];
        assert_eq!(encode(&list), r#"["драма","comedy \"noir\""]"#);
        assert_eq!(encode(&[]), "[]");
    }

    #[test]
    fn test_decode_missing_is_empty() {
        assert!(decode(None).unwrap().is_empty());
        assert!(decode(Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(Some("not json")).unwrap_err();
        assert!(matches!(err, Error::MalformedCacheData(_)));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(matches!(
            decode(Some(r#"{"genre": "drama"}"#)),
            Err(Error::MalformedCacheData(_))
        ));
        assert!(matches!(
            decode(Some("[1, 2]")),
            Err(Error::MalformedCacheData(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_round_trip(list in proptest::collection::vec(any::<String>(), 0..16)) {
            prop_assert_eq!(decode(Some(&encode(&list))).unwrap(), list);
        }
    }
}
