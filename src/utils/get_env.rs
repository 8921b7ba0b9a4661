use anyhow::{Context, Error};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;

pub fn get_env_var(key: &str) -> Result<String, Error> {
    dotenv().ok();
    Ok(env::var(key)?)
}

/// Returns the variable when it is set to something other than whitespace.
pub fn get_optional_env_var(key: &str) -> Option<String> {
    match get_env_var(key) {
        Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        _ => None,
    }
}

/// Parses the variable into `T`, falling back to `default` when unset.
/// A set but malformed value is an error rather than a silent default.
pub fn parse_env_var_or<T>(key: &str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get_optional_env_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

pub fn env_var_to_vec(key: &str) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod env_tests {
    use super::{env_var_to_vec, get_optional_env_var, parse_env_var_or};

    #[test]
    fn test_env_var_to_vec_trims_and_skips_empty() {
        unsafe {
            std::env::set_var("MDWEB_TEST_LIST", " .png, ,.TIFF ,");
        }
        assert_eq!(
            env_var_to_vec("MDWEB_TEST_LIST"),
            vec![".png".to_string(), ".TIFF".to_string()]
        );
        assert!(env_var_to_vec("MDWEB_TEST_LIST_UNSET").is_empty());
    }

    #[test]
    fn test_blank_optional_var_is_none() {
        unsafe {
            std::env::set_var("MDWEB_TEST_BLANK", "   ");
        }
        assert_eq!(get_optional_env_var("MDWEB_TEST_BLANK"), None);
    }

    #[test]
    fn test_parse_env_var_or() {
        unsafe {
            std::env::set_var("MDWEB_TEST_NUM", "42");
            std::env::set_var("MDWEB_TEST_BAD_NUM", "forty-two");
        }
        assert_eq!(parse_env_var_or("MDWEB_TEST_NUM", 7u16).unwrap(), 42);
        assert_eq!(parse_env_var_or("MDWEB_TEST_NUM_UNSET", 7u16).unwrap(), 7);
        assert!(parse_env_var_or("MDWEB_TEST_BAD_NUM", 7u16).is_err());
    }
}
