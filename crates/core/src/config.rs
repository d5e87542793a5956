use std::collections::HashMap;
use tracing::warn;
use types::{
    CapOverride, SchedulingParams, DEFAULT_MAX_STUDENTS_HARD, DEFAULT_MAX_STUDENTS_PREFERRED,
};

pub const ENV_CAP_HARD: &str = "AUTOFILL__CAPS__HARD";
pub const ENV_CAP_PREFERRED: &str = "AUTOFILL__CAPS__PREFERRED";

pub const SETTING_CAP_HARD: &str = "maxStudentsHard";
pub const SETTING_CAP_PREFERRED: &str = "maxStudentsPreferred";

/// Effective headcount ceilings for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caps {
    pub hard: u32,
    pub preferred: u32,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            hard: DEFAULT_MAX_STUDENTS_HARD,
            preferred: DEFAULT_MAX_STUDENTS_PREFERRED,
        }
    }
}

fn positive_or(name: &str, raw: i64, default: u32) -> u32 {
    match u32::try_from(raw) {
        Ok(v) if v > 0 => v,
        _ => {
            warn!(setting = name, raw, default, "non-positive cap, using default");
            default
        }
    }
}

/// Turns configured parameters plus an optional per-run override into usable caps.
pub fn resolve_caps(params: &SchedulingParams, over: Option<&CapOverride>) -> Caps {
    let mut caps = Caps {
        hard: positive_or(
            SETTING_CAP_HARD,
            params.max_students_hard,
            DEFAULT_MAX_STUDENTS_HARD,
        ),
        preferred: positive_or(
            SETTING_CAP_PREFERRED,
            params.max_students_preferred,
            DEFAULT_MAX_STUDENTS_PREFERRED,
        ),
    };
    if let Some(o) = over {
        if let Some(h) = o.max_students_hard.filter(|v| *v > 0) {
            caps.hard = h;
        }
        if let Some(p) = o.max_students_preferred.filter(|v| *v > 0) {
            caps.preferred = p;
        }
    }
    caps
}

fn parse_cap(name: &str, raw: Option<&str>, default: u32) -> i64 {
    match raw.map(str::trim) {
        None => default as i64,
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => v.floor() as i64,
            _ => {
                warn!(setting = name, raw = s, default, "non-numeric cap, using default");
                default as i64
            }
        },
    }
}

/// Reads caps from a key/value settings table.
pub fn params_from_settings(settings: &HashMap<String, String>) -> SchedulingParams {
    SchedulingParams {
        max_students_hard: parse_cap(
            SETTING_CAP_HARD,
            settings.get(SETTING_CAP_HARD).map(String::as_str),
            DEFAULT_MAX_STUDENTS_HARD,
        ),
        max_students_preferred: parse_cap(
            SETTING_CAP_PREFERRED,
            settings.get(SETTING_CAP_PREFERRED).map(String::as_str),
            DEFAULT_MAX_STUDENTS_PREFERRED,
        ),
    }
}

/// Reads caps from `AUTOFILL__CAPS__HARD` / `AUTOFILL__CAPS__PREFERRED`.
pub fn params_from_env() -> SchedulingParams {
    let hard = std::env::var(ENV_CAP_HARD).ok();
    let preferred = std::env::var(ENV_CAP_PREFERRED).ok();
    SchedulingParams {
        max_students_hard: parse_cap(ENV_CAP_HARD, hard.as_deref(), DEFAULT_MAX_STUDENTS_HARD),
        max_students_preferred: parse_cap(
            ENV_CAP_PREFERRED,
            preferred.as_deref(),
            DEFAULT_MAX_STUDENTS_PREFERRED,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_caps_fall_back_to_defaults() {
        let params = SchedulingParams {
            max_students_hard: 0,
            max_students_preferred: -5,
        };
        assert_eq!(resolve_caps(&params, None), Caps::default());
    }

    #[test]
    fn override_wins_over_configured_caps() {
        let params = SchedulingParams {
            max_students_hard: 90,
            max_students_preferred: 60,
        };
        let over = CapOverride {
            max_students_hard: Some(200),
            max_students_preferred: None,
        };
        let caps = resolve_caps(&params, Some(&over));
        assert_eq!(caps.hard, 200);
        assert_eq!(caps.preferred, 60);
    }

    #[test]
    fn settings_table_tolerates_garbage() {
        let mut settings = HashMap::new();
        settings.insert(SETTING_CAP_HARD.to_string(), "abc".to_string());
        settings.insert(SETTING_CAP_PREFERRED.to_string(), " 80 ".to_string());
        let params = params_from_settings(&settings);
        assert_eq!(params.max_students_hard, 130);
        assert_eq!(params.max_students_preferred, 80);

        let caps = resolve_caps(&params_from_settings(&HashMap::new()), None);
        assert_eq!(caps, Caps::default());
    }

    #[test]
    fn environment_overrides_default_caps() {
        std::env::set_var(ENV_CAP_HARD, "150.7");
        std::env::set_var(ENV_CAP_PREFERRED, "lots");
        let params = params_from_env();
        std::env::remove_var(ENV_CAP_HARD);
        std::env::remove_var(ENV_CAP_PREFERRED);

        assert_eq!(params.max_students_hard, 150);
        assert_eq!(params.max_students_preferred, 100);
        assert_eq!(
            resolve_caps(&params, None),
            Caps {
                hard: 150,
                preferred: 100
            }
        );
    }
}
