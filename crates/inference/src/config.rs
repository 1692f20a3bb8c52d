use common::env_parse;
use std::env;

/// Default number of timed runs per image.
pub const DEFAULT_REPEAT_COUNT: u32 = 1;

/// Largest accepted `INPUT_WIDTH` / `INPUT_HEIGHT`.
pub const MAX_INPUT_SIDE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Model input size used when neither the environment nor the model
    /// provide one
    pub default_input_size: (u32, u32),
    /// `INPUT_WIDTH` x `INPUT_HEIGHT`, takes precedence over the model
    pub input_size_override: Option<(u32, u32)>,
    /// Timed runs per image (`ONE_PIC_REPEAT_COUNT`)
    pub one_pic_repeat_count: u32,
}

impl SessionConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env(default_input_size: (u32, u32)) -> Self {
        let input_size_override = match (
            env_parse::<u32>("INPUT_WIDTH"),
            env_parse::<u32>("INPUT_HEIGHT"),
        ) {
            (Some(w), Some(h))
                if (1..=MAX_INPUT_SIDE).contains(&w) && (1..=MAX_INPUT_SIDE).contains(&h) =>
            {
                Some((w, h))
            }
            (None, None) => None,
            (w, h) => {
                tracing::warn!(
                    ?w,
                    ?h,
                    max = MAX_INPUT_SIDE,
                    "INPUT_WIDTH and INPUT_HEIGHT must both be set within 1..=max, ignoring"
                );
                None
            }
        };

        let one_pic_repeat_count =
            parse_repeat_count(env::var("ONE_PIC_REPEAT_COUNT").ok().as_deref());

        Self {
            default_input_size,
            input_size_override,
            one_pic_repeat_count,
        }
    }

    pub fn with_defaults(default_input_size: (u32, u32)) -> Self {
        Self {
            default_input_size,
            input_size_override: None,
            one_pic_repeat_count: DEFAULT_REPEAT_COUNT,
        }
    }
}

/// Interpret `ONE_PIC_REPEAT_COUNT`.
///
/// Anything but a positive integer falls back to the default.
pub fn parse_repeat_count(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_REPEAT_COUNT;
    };
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(
                value = raw,
                "Invalid ONE_PIC_REPEAT_COUNT, using {}",
                DEFAULT_REPEAT_COUNT
            );
            DEFAULT_REPEAT_COUNT
        }
    }
}
