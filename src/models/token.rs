use std::fmt;

/// ASCII payload recovered from a marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wrap an already-validated ASCII string
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    /// Borrow the payload text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the payload as a numeric user identifier
    pub fn parse_user_id(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }

    /// Take ownership of the payload text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(Token::new("123456789".into()).parse_user_id(), Some(123456789));
        assert_eq!(Token::new("abc".into()).parse_user_id(), None);
    }
}
