// =====================================================================================
// VALIDATION SERVICE - INPUT VALIDATION & SANITIZATION
// =====================================================================================

use regex::Regex;
use tracing::{debug, instrument};

use crate::models::SecurityError;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 100;

const DANGEROUS_PATTERNS: [&str; 5] = [
    r"(?is)<script[^>]*>.*?</script>",
    r"(?is)<iframe[^>]*>.*?</iframe>",
    r"(?i)javascript:",
    r"(?i)on\w+\s*=",
    r"(?i)<\s*img[^>]+onerror",
];

pub struct ValidationService {
    email: Regex,
    phone: Regex,
    phone_separators: Regex,
    username: Regex,
    dangerous: Vec<Regex>,
}

impl ValidationService {
    pub fn new() -> Result<Self, SecurityError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SecurityError::ServiceError(e.to_string()))
        };

        Ok(Self {
            email: compile(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")?,
            phone: compile(r"^\+?[0-9]{7,15}$")?,
            phone_separators: compile(r"[\s\-().]")?,
            username: compile(r"^[a-zA-Z0-9_]+$")?,
            dangerous: DANGEROUS_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Empty addresses are accepted; the field is optional everywhere it appears.
    pub fn validate_email(&self, email: &str) -> Result<(), SecurityError> {
        if email.is_empty() || self.email.is_match(email) {
            Ok(())
        } else {
            Err(SecurityError::InvalidInput("Invalid email format".to_string()))
        }
    }

    pub fn validate_phone(&self, phone: &str) -> Result<(), SecurityError> {
        if phone.is_empty() {
            return Ok(());
        }

        let cleaned = self.phone_separators.replace_all(phone, "");
        if self.phone.is_match(&cleaned) {
            Ok(())
        } else {
            Err(SecurityError::InvalidInput("Invalid phone number format".to_string()))
        }
    }

    pub fn validate_username(&self, username: &str) -> Result<(), SecurityError> {
        let len = username.chars().count();

        let message = if username.is_empty() {
            "Username is required"
        } else if len < USERNAME_MIN_LEN {
            "Username must be at least 3 characters"
        } else if len > USERNAME_MAX_LEN {
            "Username must be less than 50 characters"
        } else if !self.username.is_match(username) {
            "Username can only contain letters, numbers, and underscores"
        } else {
            return Ok(());
        };

        Err(SecurityError::InvalidInput(message.to_string()))
    }

    pub fn validate_password(&self, password: &str) -> Result<(), SecurityError> {
        let len = password.chars().count();

        let message = if password.is_empty() {
            "Password is required"
        } else if len < PASSWORD_MIN_LEN {
            "Password must be at least 6 characters"
        } else if len > PASSWORD_MAX_LEN {
            "Password too long"
        } else {
            return Ok(());
        };

        Err(SecurityError::InvalidInput(message.to_string()))
    }

    /// Truncates to `max_length` characters, strips script-bearing markup and HTML-escapes the rest.
    #[instrument(skip(self, input))]
    pub fn sanitize_input(&self, input: &str, max_length: usize) -> String {
        if input.is_empty() {
            return String::new();
        }

        let mut text: String = input.chars().take(max_length).collect();

        for pattern in &self.dangerous {
            if pattern.is_match(&text) {
                debug!("Stripping dangerous pattern {}", pattern.as_str());
                text = pattern.replace_all(&text, "").into_owned();
            }
        }

        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> ValidationService {
        ValidationService::new().unwrap()
    }

    fn message(result: Result<(), SecurityError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn email_rules() {
        let v = service();
        assert!(v.validate_email("").is_ok());
        assert!(v.validate_email("jane.doe+tag@clinic.example.org").is_ok());
        assert_eq!(message(v.validate_email("jane@")), "Invalid email format");
    }

    #[test]
    fn phone_ignores_separators() {
        let v = service();
        assert!(v.validate_phone("").is_ok());
        assert!(v.validate_phone("+1 (555) 010-0199").is_ok());
        assert!(v.validate_phone("555.010.0199").is_ok());
        assert_matches!(v.validate_phone("12345"), Err(SecurityError::InvalidInput(_)));
        assert_matches!(v.validate_phone("call me"), Err(SecurityError::InvalidInput(_)));
    }

    #[test]
    fn username_messages() {
        let v = service();
        assert_eq!(message(v.validate_username("")), "Username is required");
        assert_eq!(message(v.validate_username("ab")), "Username must be at least 3 characters");
        assert_eq!(
            message(v.validate_username(&"a".repeat(51))),
            "Username must be less than 50 characters"
        );
        assert_eq!(
            message(v.validate_username("bad name")),
            "Username can only contain letters, numbers, and underscores"
        );
        assert!(v.validate_username(&"a".repeat(50)).is_ok());
        assert!(v.validate_username("dr_house_42").is_ok());
    }

    #[test]
    fn password_messages() {
        let v = service();
        assert_eq!(message(v.validate_password("")), "Password is required");
        assert_eq!(message(v.validate_password("12345")), "Password must be at least 6 characters");
        assert_eq!(message(v.validate_password(&"x".repeat(101))), "Password too long");
        assert!(v.validate_password("123456").is_ok());
    }

    #[test]
    fn sanitize_strips_scripts_and_escapes() {
        let v = service();
        assert_eq!(v.sanitize_input("hi <script>alert(1)</script>there", 1000), "hi there");
        assert_eq!(
            v.sanitize_input("<b>\"Tom\" & 'Jerry'</b>", 1000),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
        assert_eq!(v.sanitize_input("JavaScript:alert(1)", 1000), "alert(1)");
        assert_eq!(v.sanitize_input("<div onclick = x>", 1000), "&lt;div  x&gt;");
    }

    #[test]
    fn sanitize_truncates_by_characters() {
        let v = service();
        assert_eq!(v.sanitize_input("ééééé", 3), "ééé");
        assert_eq!(v.sanitize_input("", 3), "");
    }
}
