//! Stateless input checks: email shape, password strength, and the
//! Brazilian registry document formats (CNPJ, CPF, CEP).
//!
//! All functions are pure; no I/O and no allocation beyond the result.

use serde::Serialize;

/// Strip everything that is not an ASCII digit.
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Conservative `local@domain.tld` shape check. Purely syntactic, no
/// DNS/MX lookup.
pub fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }

    let mut labels = domain.split('.');
    let label_count = domain.split('.').count();
    if label_count < 2 {
        return false;
    }
    if !labels.all(|label| {
        !label.is_empty()
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    }) {
        return false;
    }

    // TLD must be alphabetic and at least two chars.
    let tld = domain.rsplit('.').next().unwrap_or("");
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordCheck {
    pub is_valid: bool,
    pub strength: PasswordStrength,
    pub message: String,
}

/// Length gates validity; strength is informational only.
pub fn validate_password(password: &str) -> PasswordCheck {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    let strength = if has_upper && has_lower && has_digit && has_special {
        PasswordStrength::Strong
    } else if has_upper && has_lower && has_digit {
        PasswordStrength::Medium
    } else {
        PasswordStrength::Weak
    };

    let is_valid = password.len() >= 8;
    let message = if is_valid {
        "Password accepted".to_string()
    } else {
        "Password must be at least 8 characters".to_string()
    };

    PasswordCheck {
        is_valid,
        strength,
        message,
    }
}

fn check_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validate a 14-digit company registry number (CNPJ).
///
/// Two mod-11 check digits: weights cycle 5,4,3,2,9,8,7,6,... for the
/// first and 6,5,4,3,2,9,8,7,6,... for the second. All-equal sequences
/// are always rejected.
pub fn validate_cnpj(input: &str) -> bool {
    let digits: Vec<u32> = strip_non_digits(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }

    let first_weights = [5u32, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let second_weights = [6u32, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let d13 = check_digit(&digits[..12], first_weights.iter().copied());
    if d13 != digits[12] {
        return false;
    }

    let d14 = check_digit(&digits[..13], second_weights.iter().copied());
    d14 == digits[13]
}

/// Validate an 11-digit personal registry number (CPF).
pub fn validate_cpf(input: &str) -> bool {
    let digits: Vec<u32> = strip_non_digits(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }

    let d10 = check_digit(&digits[..9], (2..=10).rev());
    if d10 != digits[9] {
        return false;
    }

    let d11 = check_digit(&digits[..10], (2..=11).rev());
    d11 == digits[10]
}

/// Validate an 8-digit postal code (CEP) shape.
pub fn validate_cep(input: &str) -> bool {
    strip_non_digits(input).len() == 8
}

/// Format a digits-only CNPJ for display: `XX.XXX.XXX/XXXX-XX`.
///
/// Returns the input unchanged when it is not 14 digits.
pub fn format_cnpj(digits: &str) -> String {
    if digits.len() != 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return digits.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}
