use chrono::{DateTime, NaiveDateTime, Utc};

use super::types::{Cookie, ParseErrorKind, ParseWarningKind};

const COOKIE_DATE_FORMATS: [&str; 2] = [
    // Netscape cookie format: 21-Oct-2015 07:28:00
    "%d-%b-%Y %H:%M:%S",
    // RFC 1123: 21 Oct 2015 07:28:00
    "%d %b %Y %H:%M:%S",
];

/// Parses a cookie `expires` value. Only GMT/UTC zone names are accepted.
/// The leading weekday is not checked against the date.
pub fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = value.trim().rsplit_once(' ')?;
    if !matches!(zone.to_ascii_uppercase().as_str(), "GMT" | "UTC" | "UT") {
        return None;
    }
    let (_weekday, stamp) = stamp.split_once(',')?;
    COOKIE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(stamp.trim(), format).ok())
        .map(|naive| naive.and_utc())
}

pub(super) fn parse_set_cookie(
    raw: &str,
    strict_dates: bool,
    warnings: &mut Vec<ParseWarningKind>,
) -> Result<Cookie, ParseErrorKind> {
    let mut cookie = Cookie::default();
    let mut seen_pair = false;

    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
            continue;
        }
        if token.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
            continue;
        }

        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (token, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "expires" => match parse_cookie_date(value) {
                Some(expires) => cookie.expires = Some(expires),
                None if strict_dates => {
                    return Err(ParseErrorKind::InvalidCookieExpires(value.to_string()));
                }
                None => warnings.push(ParseWarningKind::InvalidCookieExpires(value.to_string())),
            },
            "max-age" => match value.parse::<i64>() {
                Ok(seconds) => cookie.max_age = Some(seconds),
                Err(_) => warnings.push(ParseWarningKind::InvalidCookieMaxAge(value.to_string())),
            },
            "path" => cookie.path = Some(value.to_string()),
            "domain" => cookie.domain = Some(value.to_string()),
            "samesite" => cookie.same_site = Some(value.to_string()),
            _ if !seen_pair => {
                cookie.name = name.to_string();
                cookie.value = value.to_string();
                seen_pair = true;
            }
            _ => cookie
                .extensions
                .push((name.to_string(), value.to_string())),
        }
    }

    Ok(cookie)
}

#[cfg(test)]
mod tests {
    use super::{parse_cookie_date, parse_set_cookie};
    use crate::http1::{ParseErrorKind, ParseWarningKind};

    #[test]
    fn parses_netscape_date() {
        let date = parse_cookie_date("Wed, 21-Oct-2015 07:28:00 GMT").unwrap();
        assert_eq!(date.timestamp(), 1_445_412_480);
    }

    #[test]
    fn parses_rfc1123_date() {
        let date = parse_cookie_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(date.timestamp(), 1_445_412_480);
    }

    #[test]
    fn ignores_mismatched_weekday() {
        let date = parse_cookie_date("Thu, 21-Oct-2015 07:28:00 GMT").unwrap();
        assert_eq!(date.timestamp(), 1_445_412_480);
    }

    #[test]
    fn mismatched_weekday_keeps_expires() {
        let mut warnings = Vec::new();
        let cookie =
            parse_set_cookie("a=1; expires=Thu, 21-Oct-2015 07:28:00 GMT", false, &mut warnings)
                .unwrap();
        assert_eq!(cookie.expires.unwrap().timestamp(), 1_445_412_480);
        assert!(warnings.is_empty());
    }

    #[test]
    fn rejects_unknown_zone() {
        assert!(parse_cookie_date("Wed, 21-Oct-2015 07:28:00 PST").is_none());
    }

    #[test]
    fn rejects_garbage_date() {
        assert!(parse_cookie_date("tomorrow").is_none());
        assert!(parse_cookie_date("").is_none());
    }

    #[test]
    fn parses_full_cookie() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie(
            "sid=abc; Expires=Wed, 21-Oct-2015 07:28:00 GMT; Path=/app; Domain=Example.com; Secure; HttpOnly",
            false,
            &mut warnings,
        )
        .unwrap();

        assert_eq!(cookie.name, "sid");
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.expires.unwrap().timestamp(), 1_445_412_480);
        assert_eq!(cookie.path.as_deref(), Some("/app"));
        assert_eq!(cookie.domain.as_deref(), Some("Example.com"));
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert!(warnings.is_empty());
    }

    #[test]
    fn value_keeps_everything_after_first_equals() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie("token=a=b==", false, &mut warnings).unwrap();
        assert_eq!(cookie.name, "token");
        assert_eq!(cookie.value, "a=b==");
    }

    #[test]
    fn token_without_equals_is_a_bare_name() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie("flag", false, &mut warnings).unwrap();
        assert_eq!(cookie.name, "flag");
        assert_eq!(cookie.value, "");
    }

    #[test]
    fn later_pairs_do_not_replace_the_cookie_pair() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie(
            "id=7; Max-Age=3600; SameSite=Lax; Priority=High",
            false,
            &mut warnings,
        )
        .unwrap();
        assert_eq!(cookie.name, "id");
        assert_eq!(cookie.value, "7");
        assert_eq!(cookie.max_age, Some(3600));
        assert_eq!(cookie.same_site.as_deref(), Some("Lax"));
        assert_eq!(
            cookie.extensions,
            vec![("Priority".to_string(), "High".to_string())]
        );
    }

    #[test]
    fn empty_tokens_are_skipped() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie(" ; a=1 ;; secure ;", false, &mut warnings).unwrap();
        assert_eq!(cookie.name, "a");
        assert!(cookie.secure);
        assert!(!cookie.http_only);
    }

    #[test]
    fn bad_expires_is_dropped_in_lenient_mode() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie("a=1; expires=soon; path=/", false, &mut warnings).unwrap();
        assert_eq!(cookie.name, "a");
        assert!(cookie.expires.is_none());
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(
            warnings,
            vec![ParseWarningKind::InvalidCookieExpires("soon".to_string())]
        );
    }

    #[test]
    fn bad_expires_fails_in_strict_mode() {
        let mut warnings = Vec::new();
        let err = parse_set_cookie("a=1; expires=soon", true, &mut warnings).unwrap_err();
        assert_eq!(err, ParseErrorKind::InvalidCookieExpires("soon".to_string()));
    }

    #[test]
    fn bad_max_age_warns() {
        let mut warnings = Vec::new();
        let cookie = parse_set_cookie("a=1; max-age=forever", false, &mut warnings).unwrap();
        assert!(cookie.max_age.is_none());
        assert_eq!(
            warnings,
            vec![ParseWarningKind::InvalidCookieMaxAge("forever".to_string())]
        );
    }
}
