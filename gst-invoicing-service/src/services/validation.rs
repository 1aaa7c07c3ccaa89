//! Identifier validation for GST registration and classification codes.

use crate::error::ValidationIssue;
use std::fmt;

/// Minimum classification code length before an advisory warning is raised.
const HSN_MIN_LENGTH: usize = 4;

/// Why a GSTIN failed shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GstinError {
    Empty,
    WrongLength { actual: usize },
    InvalidStateCode,
    InvalidPanSegment { position: usize },
    InvalidEntityCode,
    MissingZMarker,
    InvalidCheckCharacter,
}

impl fmt::Display for GstinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GstinError::Empty => write!(f, "must not be empty"),
            GstinError::WrongLength { actual } => {
                write!(f, "must be exactly 15 characters, got {}", actual)
            }
            GstinError::InvalidStateCode => {
                write!(f, "must start with a two-digit state code")
            }
            GstinError::InvalidPanSegment { position } => {
                write!(
                    f,
                    "character {} must be an uppercase letter or digit",
                    position
                )
            }
            GstinError::InvalidEntityCode => {
                write!(f, "character 13 must be an uppercase letter or digit")
            }
            GstinError::MissingZMarker => write!(f, "character 14 must be 'Z'"),
            GstinError::InvalidCheckCharacter => {
                write!(f, "character 15 must be an uppercase letter or digit")
            }
        }
    }
}

fn is_gstin_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase()
}

/// Shape validation for GST identifiers. Checks structure only; check-digit
/// verification is left to the registration authority.
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// Validate the 15-character GSTIN shape: two digits (state code), ten
    /// uppercase alphanumerics (PAN), one entity code, the literal 'Z', and
    /// one check character.
    pub fn validate_gstin(gstin: &str) -> Result<(), GstinError> {
        if gstin.is_empty() {
            return Err(GstinError::Empty);
        }

        let chars: Vec<char> = gstin.chars().collect();
        if chars.len() != 15 {
            return Err(GstinError::WrongLength {
                actual: chars.len(),
            });
        }

        if !chars[0].is_ascii_digit() || !chars[1].is_ascii_digit() {
            return Err(GstinError::InvalidStateCode);
        }

        for (i, c) in chars[2..12].iter().enumerate() {
            if !is_gstin_char(*c) {
                return Err(GstinError::InvalidPanSegment { position: i + 3 });
            }
        }

        if !is_gstin_char(chars[12]) {
            return Err(GstinError::InvalidEntityCode);
        }

        if chars[13] != 'Z' {
            return Err(GstinError::MissingZMarker);
        }

        if !is_gstin_char(chars[14]) {
            return Err(GstinError::InvalidCheckCharacter);
        }

        Ok(())
    }

    /// Place-of-supply codes are exactly two ASCII digits.
    pub fn is_valid_state_code(code: &str) -> bool {
        code.len() == 2 && code.chars().all(|c| c.is_ascii_digit())
    }

    /// Advisory check on the classification (HSN/SAC) code. A missing or
    /// short code warns but never fails the request.
    pub fn hsn_warning(line_no: usize, hsn_code: Option<&str>) -> Option<ValidationIssue> {
        let field = format!("items[{}].hsn_code", line_no - 1);
        match hsn_code {
            None => Some(ValidationIssue::new(
                field,
                "classification code is missing",
            )),
            Some(code) if code.chars().count() < HSN_MIN_LENGTH => Some(ValidationIssue::new(
                field,
                format!(
                    "classification code '{}' is shorter than {} characters",
                    code, HSN_MIN_LENGTH
                ),
            )),
            Some(_) => None,
        }
    }
}
