use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()))
    }
}

/// Read and parse an environment variable.
///
/// Returns `None` when the variable is unset, empty or fails to parse.
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(
            Environment::parse("staging"),
            Environment::Development,
            "Unknown environments should fall back to development"
        );
    }

    #[test]
    #[serial]
    fn test_env_parse_reads_and_rejects() {
        // SAFETY: serialised with every other env-mutating test
        unsafe { env::set_var("COMMON_TEST_VALUE", " 42 ") };
        assert_eq!(env_parse::<u32>("COMMON_TEST_VALUE"), Some(42));

        unsafe { env::set_var("COMMON_TEST_VALUE", "forty-two") };
        assert_eq!(env_parse::<u32>("COMMON_TEST_VALUE"), None);

        unsafe { env::set_var("COMMON_TEST_VALUE", "") };
        assert_eq!(env_parse::<u32>("COMMON_TEST_VALUE"), None);

        unsafe { env::remove_var("COMMON_TEST_VALUE") };
        assert_eq!(env_parse::<u32>("COMMON_TEST_VALUE"), None);
    }

    #[test]
    #[serial]
    fn test_environment_from_env() {
        unsafe { env::set_var("ENVIRONMENT", "production") };
        assert_eq!(Environment::from_env(), Environment::Production);

        unsafe { env::remove_var("ENVIRONMENT") };
        assert_eq!(Environment::from_env(), Environment::Development);
    }
}
