use crate::errors::{ValidationError, DomainResult, DomainError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// A trait that drafts implement for validation.
pub trait Validate {
    /// Validates the draft and returns the first failing rule.
    fn validate(&self) -> DomainResult<()>;
}

static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap()
});

fn number_regex() -> &'static Regex {
    &NUMBER_REGEX
}

fn uuid_regex() -> &'static Regex {
    &UUID_REGEX
}

/// Struct for configuring validations in a fluent style
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where T: Default + PartialEq {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where F: FnOnce(&T) -> Result<(), ValidationError> {
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Presence check on the trimmed value
    pub fn not_blank(mut self) -> Self {
        let blank = self.value.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.chars().count() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !value.trim().is_empty() && !pattern.is_match(value.trim()) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn number(self) -> Self {
        self.matches_pattern(number_regex(), "must be a number")
    }

    pub fn uuid_string(self) -> Self {
        self.matches_pattern(uuid_regex(), "must be a valid UUID")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            let value = value.trim();
            if !value.is_empty() && !allowed_values.contains(&value) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors.push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where T: PartialOrd + Clone + std::fmt::Display
{
    pub fn min(mut self, min: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    &format!("must be at least {}", min),
                ));
            }
        }
        self
    }

    /// Strictly greater than `bound`
    pub fn greater_than(mut self, bound: T) -> Self {
        if let Some(value) = &self.value {
            if value <= &bound {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    &format!("must be greater than {}", bound),
                ));
            }
        }
        self
    }

    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string()
                ));
            }
        }
        self
    }
}

/// Date validation helpers
impl ValidationBuilder<NaiveDate> {
    pub fn after(mut self, date: NaiveDate, other_field: &str) -> Self {
        if let Some(value) = &self.value {
            if value <= &date {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    &format!("must be after {}", other_field)
                ));
            }
        }
        self
    }
}

/// Form-field helpers shared by the entity drafts
pub mod common {
    use super::*;

    /// Required-field presence check: non-empty after trim.
    pub fn require(field_name: &str, value: &str) -> DomainResult<()> {
        ValidationBuilder::new(field_name, Some(value.to_string()))
            .not_blank()
            .validate()
    }

    /// Runs the presence check over a list of `(field, value)` pairs and
    /// stops at the first missing one.
    pub fn require_all(fields: &[(&str, &str)]) -> DomainResult<()> {
        for (name, value) in fields {
            require(name, value)?;
        }
        Ok(())
    }

    pub fn parse_date(field_name: &str, value: &str) -> DomainResult<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            DomainError::Validation(ValidationError::format(
                field_name,
                "must be in the format YYYY-MM-DD",
            ))
        })
    }

    pub fn parse_optional_date(field_name: &str, value: &str) -> DomainResult<Option<NaiveDate>> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        parse_date(field_name, value).map(Some)
    }

    pub fn parse_decimal(field_name: &str, value: &str) -> DomainResult<Decimal> {
        ValidationBuilder::new(field_name, Some(value.to_string()))
            .number()
            .validate()?;
        Decimal::from_str(value.trim()).map_err(|_| {
            DomainError::Validation(ValidationError::format(field_name, "must be a number"))
        })
    }

    /// Empty input parses to zero, matching the form's numeric defaults
    pub fn parse_decimal_or_zero(field_name: &str, value: &str) -> DomainResult<Decimal> {
        if value.trim().is_empty() {
            return Ok(Decimal::ZERO);
        }
        parse_decimal(field_name, value)
    }

    pub fn parse_optional_f64(field_name: &str, value: &str) -> DomainResult<Option<f64>> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        ValidationBuilder::new(field_name, Some(trimmed.to_string()))
            .number()
            .validate()?;
        trimmed.parse::<f64>().map(Some).map_err(|_| {
            DomainError::Validation(ValidationError::format(field_name, "must be a number"))
        })
    }

    pub fn parse_i64(field_name: &str, value: &str) -> DomainResult<i64> {
        value.trim().parse::<i64>().map_err(|_| {
            DomainError::Validation(ValidationError::format(field_name, "must be a whole number"))
        })
    }

    pub fn parse_optional_i64(field_name: &str, value: &str) -> DomainResult<Option<i64>> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        parse_i64(field_name, value).map(Some)
    }

    pub fn parse_uuid(field_name: &str, value: &str) -> DomainResult<Uuid> {
        ValidationBuilder::new(field_name, Some(value.to_string()))
            .uuid_string()
            .validate()?;
        Uuid::parse_str(value.trim()).map_err(|_| DomainError::InvalidUuid(value.to_string()))
    }

    pub fn parse_optional_uuid(field_name: &str, value: &str) -> DomainResult<Option<Uuid>> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        parse_uuid(field_name, value).map(Some)
    }

    /// Trimmed text, or `None` when blank
    pub fn optional_text(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_min_reports_lower_bound() {
        let err = ValidationBuilder::new("realized_budget", Some(dec!(-1)))
            .min(Decimal::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            DomainError::Validation(ValidationError::invalid_value("realized_budget", "must be at least 0")).to_string()
        );
        assert!(!err.to_string().contains("maximum"));

        assert!(ValidationBuilder::new("beneficiary_count", Some(0i64)).min(0).validate().is_ok());
    }

    #[test]
    fn test_number_validation() {
        assert!(number_regex().is_match("1000"));
        assert!(number_regex().is_match("1000.50"));
        assert!(number_regex().is_match("-12.5"));
        assert!(!number_regex().is_match("12,5"));
        assert!(!number_regex().is_match("abc"));
    }

    #[test]
    fn test_uuid_validation() {
        assert!(uuid_regex().is_match("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!uuid_regex().is_match("not-a-uuid"));
    }

    #[test]
    fn test_not_blank() {
        let result = ValidationBuilder::new("name", Some("   ".to_string()))
            .not_blank()
            .validate();
        match result {
            Err(DomainError::Validation(ValidationError::Required { field })) => assert_eq!(field, "name"),
            other => panic!("expected required error, got {:?}", other),
        }

        assert!(ValidationBuilder::new("name", Some(" x ".to_string())).not_blank().validate().is_ok());
        assert!(ValidationBuilder::<String>::new("name", None).not_blank().validate().is_err());
    }

    #[test]
    fn test_first_error_wins() {
        let result = ValidationBuilder::new("code", Some("".to_string()))
            .not_blank()
            .max_length(0)
            .validate();
        assert!(matches!(result, Err(DomainError::Validation(ValidationError::Required { .. }))));
    }

    #[test]
    fn test_numeric_validations() {
        assert!(ValidationBuilder::new("age", Some(121)).range(0, 120).validate().is_err());
        assert!(ValidationBuilder::new("age", Some(0)).range(0, 120).validate().is_ok());
        assert!(ValidationBuilder::new("budget", Some(0.0)).greater_than(0.0).validate().is_err());
        assert!(ValidationBuilder::new("budget", Some(0.01)).greater_than(0.0).validate().is_ok());
        assert!(ValidationBuilder::new("spent", Some(-1)).min(0).validate().is_err());
    }

    #[test]
    fn test_date_after() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let same = ValidationBuilder::new("end_date", Some(start))
            .after(start, "start_date")
            .validate();
        assert!(same.is_err());

        let later = ValidationBuilder::new("end_date", NaiveDate::from_ymd_opt(2024, 1, 2))
            .after(start, "start_date")
            .validate();
        assert!(later.is_ok());
    }

    #[test]
    fn test_common_parsers() {
        assert!(common::require_all(&[("name", "Water"), ("responsible", "")]).is_err());
        assert!(common::parse_date("date", "2024-03-01").is_ok());
        assert!(common::parse_date("date", "01/03/2024").is_err());
        assert_eq!(common::parse_decimal_or_zero("budget", "").unwrap(), Decimal::ZERO);
        assert!(common::parse_decimal("budget", "12k").is_err());
        assert_eq!(common::parse_optional_f64("latitude", " 14.5 ").unwrap(), Some(14.5));
        assert_eq!(common::parse_optional_f64("latitude", "").unwrap(), None);
        assert!(common::parse_uuid("project_id", "nope").is_err());
        assert_eq!(common::optional_text("  "), None);
        assert_eq!(common::optional_text(" a "), Some("a".to_string()));
    }
}
