//! Option validation rules
//!
//! Commands describe their constraints as an ordered list of [`Rule`]s; the
//! first failing rule wins. Nothing here touches the network or the disk.

use crate::error::ValidationError;
use chrono::NaiveDate;

const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

#[derive(Debug, Clone)]
pub enum Rule<'a> {
    /// Canonical 8-4-4-4-12 hex GUID, when supplied
    Guid {
        option: &'static str,
        value: Option<&'a str>,
    },
    /// Absolute https:// SharePoint Online URL, when supplied
    SharePointUrl {
        option: &'static str,
        value: Option<&'a str>,
    },
    /// Case-insensitive member of `allowed`, when supplied
    OneOf {
        option: &'static str,
        value: Option<&'a str>,
        allowed: &'static [&'static str],
    },
    /// YYYY-MM-DD, when supplied
    Date {
        option: &'static str,
        value: Option<&'a str>,
    },
    /// `option` must be present whenever `active` holds
    RequiredWhen {
        option: &'static str,
        present: bool,
        active: bool,
        condition: &'static str,
    },
    /// Exactly one of two alternative options selecting the same target
    ExactlyOne {
        first: &'static str,
        first_present: bool,
        second: &'static str,
        second_present: bool,
    },
}

pub fn is_valid_guid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();

    groups.len() == GUID_GROUPS.len()
        && groups
            .iter()
            .zip(GUID_GROUPS)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn is_valid_sharepoint_url(value: &str) -> bool {
    if !value.to_ascii_lowercase().starts_with("https://") {
        return false;
    }

    match reqwest::Url::parse(value) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// The canonical spelling of `value` among `allowed`, ignoring case
pub fn match_one_of(value: &str, allowed: &'static [&'static str]) -> Option<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(value))
}

pub fn is_valid_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

impl Rule<'_> {
    fn check(&self) -> Result<(), ValidationError> {
        match *self {
            Rule::Guid {
                option,
                value: Some(value),
            } if !is_valid_guid(value) => Err(ValidationError::InvalidGuid {
                option: option.to_string(),
                value: value.to_string(),
            }),
            Rule::SharePointUrl {
                option,
                value: Some(value),
            } if !is_valid_sharepoint_url(value) => Err(ValidationError::InvalidUrl {
                option: option.to_string(),
                value: value.to_string(),
            }),
            Rule::OneOf {
                option,
                value: Some(value),
                allowed,
            } if match_one_of(value, allowed).is_none() => Err(ValidationError::InvalidEnumValue {
                option: option.to_string(),
                value: value.to_string(),
                allowed: allowed.iter().map(|a| a.to_string()).collect(),
            }),
            Rule::Date {
                option,
                value: Some(value),
            } if !is_valid_date(value) => Err(ValidationError::InvalidDate {
                option: option.to_string(),
                value: value.to_string(),
            }),
            Rule::RequiredWhen {
                option,
                present: false,
                active: true,
                condition,
            } => Err(ValidationError::MissingConditionalOption {
                option: option.to_string(),
                condition: condition.to_string(),
            }),
            Rule::ExactlyOne {
                first,
                first_present,
                second,
                second_present,
            } if first_present == second_present => Err(ValidationError::AmbiguousOrMissingTarget {
                first: first.to_string(),
                second: second.to_string(),
                both: first_present,
            }),
            _ => Ok(()),
        }
    }
}

/// Evaluate rules in order, stopping at the first failure
pub fn check(rules: &[Rule<'_>]) -> Result<(), ValidationError> {
    rules.iter().try_for_each(Rule::check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_guids() {
        assert!(is_valid_guid("f09c4efe-b8c0-4e89-a166-03418661b89b"));
        assert!(is_valid_guid("0CD891EF-AFCE-4E55-B836-FCE03286CCCF"));
    }

    #[test]
    fn test_invalid_guids() {
        assert!(!is_valid_guid("12345"));
        assert!(!is_valid_guid(""));
        // missing a hyphen group
        assert!(!is_valid_guid("f09c4efe-b8c0-4e89-03418661b89b"));
        assert!(!is_valid_guid("f09c4efeb8c04e89a16603418661b89b"));
        // non-hex characters
        assert!(!is_valid_guid("g09c4efe-b8c0-4e89-a166-03418661b89b"));
        assert!(!is_valid_guid("f09c4efe-b8c0-4e89-a166-03418661b89z"));
        // wrapped forms are not canonical
        assert!(!is_valid_guid("{f09c4efe-b8c0-4e89-a166-03418661b89b}"));
        assert!(!is_valid_guid("f09c4efe-b8c0-4e89-a166-03418661b89b-"));
    }

    #[test]
    fn test_sharepoint_urls() {
        assert!(is_valid_sharepoint_url("https://contoso.sharepoint.com"));
        assert!(is_valid_sharepoint_url("https://contoso.sharepoint.com/sites/project-x"));
        assert!(is_valid_sharepoint_url("HTTPS://contoso.sharepoint.com/sites/apps"));
        assert!(!is_valid_sharepoint_url("foo"));
        assert!(!is_valid_sharepoint_url("http://contoso.sharepoint.com"));
        assert!(!is_valid_sharepoint_url("https://"));
        assert!(!is_valid_sharepoint_url("/sites/project-x"));
    }

    #[test]
    fn test_one_of_is_case_insensitive() {
        const SCOPES: &[&str] = &["tenant", "sitecollection"];
        assert_eq!(match_one_of("SiteCollection", SCOPES), Some("sitecollection"));
        assert_eq!(match_one_of("web", SCOPES), None);
    }

    #[test]
    fn test_dates() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("2024-2-1"));
        assert!(!is_valid_date("yesterday"));
    }

    #[test]
    fn test_absent_values_pass() {
        let rules = [
            Rule::Guid { option: "id", value: None },
            Rule::SharePointUrl { option: "webUrl", value: None },
            Rule::OneOf { option: "scope", value: None, allowed: &["tenant"] },
            Rule::Date { option: "date", value: None },
        ];
        assert!(check(&rules).is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        let rules = [
            Rule::OneOf { option: "scope", value: Some("web"), allowed: &["tenant", "sitecollection"] },
            Rule::Guid { option: "id", value: Some("12345") },
        ];
        assert!(matches!(
            check(&rules),
            Err(ValidationError::InvalidEnumValue { ref value, .. }) if value == "web"
        ));
    }

    #[test]
    fn test_required_when() {
        let rule = Rule::RequiredWhen {
            option: "appCatalogUrl",
            present: false,
            active: true,
            condition: "the scope is sitecollection",
        };
        assert_eq!(
            check(&[rule]).unwrap_err().to_string(),
            "You must specify appCatalogUrl when the scope is sitecollection"
        );

        let inactive = Rule::RequiredWhen {
            option: "appCatalogUrl",
            present: false,
            active: false,
            condition: "the scope is sitecollection",
        };
        assert!(check(&[inactive]).is_ok());
    }

    #[test]
    fn test_exactly_one() {
        let rule = |a, b| Rule::ExactlyOne {
            first: "id",
            first_present: a,
            second: "fileUrl",
            second_present: b,
        };
        assert!(check(&[rule(true, false)]).is_ok());
        assert!(check(&[rule(false, true)]).is_ok());
        assert!(matches!(
            check(&[rule(true, true)]),
            Err(ValidationError::AmbiguousOrMissingTarget { both: true, .. })
        ));
        assert!(matches!(
            check(&[rule(false, false)]),
            Err(ValidationError::AmbiguousOrMissingTarget { both: false, .. })
        ));
    }
}
