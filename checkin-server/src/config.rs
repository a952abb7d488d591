//! Server configuration

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono_tz::Tz;
use cron::Schedule;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Check-in server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP listen port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Frontend origin (CORS) and base URL for links in notifications
    pub frontend_url: String,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in days
    pub jwt_expiry_days: i64,
    /// LINE Messaging API channel access token (empty: pushes are skipped)
    pub line_channel_access_token: String,
    /// LINE Login channel id
    pub line_client_id: String,
    /// LINE Login channel secret
    pub line_client_secret: String,
    /// Redirect URI registered for LINE Login
    pub line_redirect_uri: String,
    /// Alert batch schedule, normalized to the seconds-first form
    pub alert_schedule: String,
    /// Zone the alert schedule is evaluated in
    pub alert_timezone: Tz,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let raw_schedule =
            std::env::var("QUIZ_ALERT_CRON_SCHEDULE").unwrap_or_else(|_| "0 * * * *".into());
        let alert_schedule = normalize_cron(&raw_schedule)?;

        let tz_name = std::env::var("QUIZ_ALERT_TIMEZONE").unwrap_or_else(|_| "Asia/Tokyo".into());
        let alert_timezone: Tz = tz_name
            .parse()
            .map_err(|_| format!("QUIZ_ALERT_TIMEZONE is not a valid IANA zone: {tz_name}"))?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: environment.clone(),
            line_redirect_uri: std::env::var("LINE_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{frontend_url}/auth/callback")),
            frontend_url,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_days: std::env::var("JWT_EXPIRY_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .filter(|d: &i64| *d > 0)
                .unwrap_or(7),
            line_channel_access_token: std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
                .unwrap_or_default(),
            line_client_id: Self::require_secret("LINE_CLIENT_ID", &environment)?,
            line_client_secret: Self::require_secret("LINE_CLIENT_SECRET", &environment)?,
            alert_schedule,
            alert_timezone,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Accept standard 5-field cron (minute first, weekday 0-7 with Sunday as 0
/// or 7) as well as the 6/7-field seconds-first form, returning the
/// seconds-first form.
pub fn normalize_cron(expr: &str) -> Result<String, BoxError> {
    let expr = expr.trim();
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let normalized = match fields.as_slice() {
        [minute, hour, day, month, weekday] => {
            let weekday = crate_weekdays(weekday)
                .map_err(|e| format!("invalid cron expression {expr:?}: {e}"))?;
            format!("0 {minute} {hour} {day} {month} {weekday}")
        }
        [_, _, _, _, _, _] | [_, _, _, _, _, _, _] => fields.join(" "),
        _ => {
            return Err(format!(
                "cron expression must have 5, 6 or 7 fields, got {}: {expr}",
                fields.len()
            )
            .into());
        }
    };
    Schedule::from_str(&normalized).map_err(|e| format!("invalid cron expression {expr:?}: {e}"))?;
    Ok(normalized)
}

/// Rewrite a standard weekday field into the `cron` crate's numbering
/// (1-7, Sunday = 1). Numeric values, ranges and steps are expanded to a
/// list; `*`, `?` and day names pass through untouched.
fn crate_weekdays(field: &str) -> Result<String, String> {
    let mut kept = Vec::new();
    let mut days = BTreeSet::new();

    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };
        if range.is_empty() || !range.chars().all(|c| c.is_ascii_digit() || c == '-') {
            kept.push(part.to_string());
            continue;
        }

        let step = match step {
            Some(step) => step
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("invalid weekday step in {part:?}"))?,
            None => 1,
        };
        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (weekday_number(start)?, weekday_number(end)?),
            // `n/step` runs to the end of the week
            None if step > 1 => (weekday_number(range)?, 6),
            None => {
                let day = weekday_number(range)?;
                (day, day)
            }
        };
        if start > end {
            return Err(format!("weekday range {part:?} runs backwards"));
        }
        days.extend((start..=end).step_by(step).map(|day| day % 7 + 1));
    }

    kept.extend(days.into_iter().map(|day| day.to_string()));
    Ok(kept.join(","))
}

fn weekday_number(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .ok()
        .filter(|day| *day <= 7)
        .ok_or_else(|| format!("weekday {value:?} is not in 0-7"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_field_cron_gets_seconds() {
        assert_eq!(normalize_cron("0 * * * *").unwrap(), "0 0 * * * *");
        assert_eq!(normalize_cron(" */15 9-18 * * * ").unwrap(), "0 */15 9-18 * * *");
    }

    #[test]
    fn five_field_weekdays_count_from_sunday_zero() {
        assert_eq!(normalize_cron("0 9 * * 1").unwrap(), "0 0 9 * * 2");
        assert_eq!(normalize_cron("0 9 * * 0").unwrap(), "0 0 9 * * 1");
        assert_eq!(normalize_cron("0 9 * * 7").unwrap(), "0 0 9 * * 1");
        assert_eq!(normalize_cron("0 9 * * 1-5").unwrap(), "0 0 9 * * 2,3,4,5,6");
        assert_eq!(normalize_cron("0 9 * * 5-7").unwrap(), "0 0 9 * * 1,6,7");
        assert_eq!(normalize_cron("0 9 * * 0-6/2").unwrap(), "0 0 9 * * 1,3,5,7");
        assert_eq!(normalize_cron("0 9 * * 3/2").unwrap(), "0 0 9 * * 4,6");
        assert_eq!(normalize_cron("0 9 * * 0,6").unwrap(), "0 0 9 * * 1,7");
        assert_eq!(normalize_cron("0 9 * * MON-FRI").unwrap(), "0 0 9 * * MON-FRI");
    }

    #[test]
    fn bad_weekdays_are_rejected() {
        assert!(normalize_cron("0 9 * * 8").is_err());
        assert!(normalize_cron("0 9 * * 5-1").is_err());
        assert!(normalize_cron("0 9 * * 1/0").is_err());
    }

    #[test]
    fn six_field_cron_is_kept() {
        assert_eq!(normalize_cron("30 0 * * * *").unwrap(), "30 0 * * * *");
    }

    #[test]
    fn bad_cron_is_rejected() {
        assert!(normalize_cron("every hour").is_err());
        assert!(normalize_cron("* * *").is_err());
        assert!(normalize_cron("99 * * * *").is_err());
    }
}
