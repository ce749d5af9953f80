use std::str::FromStr;

use factorec::prelude::*;

pub fn non_zero_usize(value: &str) -> Result<usize> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

/// Parses `<USER>:<ITEM>`, splitting on the first colon so that item IDs may contain colons.
pub fn user_item_pair(value: &str) -> Result<(String, String)> {
    match value.split_once(':') {
        Some((user_id, item_id)) if !user_id.is_empty() && !item_id.is_empty() => {
            Ok((user_id.to_string(), item_id.to_string()))
        }
        _ => Err(anyhow!("expected `<USER>:<ITEM>`, got `{}`", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_usize_ok() -> Result {
        assert_eq!(non_zero_usize("8")?, 8);
        assert!(non_zero_usize("0").is_err());
        assert!(non_zero_usize("-1").is_err());
        Ok(())
    }

    #[test]
    fn user_item_pair_ok() -> Result {
        assert_eq!(user_item_pair("1:A")?, ("1".to_string(), "A".to_string()));
        assert_eq!(user_item_pair("1:a:b")?, ("1".to_string(), "a:b".to_string()));
        assert!(user_item_pair("1").is_err());
        assert!(user_item_pair(":A").is_err());
        Ok(())
    }
}
