use zeroize::Zeroizing;

/// A passphrase or message password.
///
/// The bytes are wiped when the value is dropped.
#[derive(derive_more::Debug, Clone, Default)]
pub struct Password(#[debug("***")] Zeroizing<Vec<u8>>);

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value.into_bytes().into())
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec().into())
    }
}

impl From<&[u8]> for Password {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec().into())
    }
}

impl Password {
    /// Creates an empty password.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw password bytes.
    pub fn read(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacted() {
        let pw = Password::from("hunter2");
        assert_eq!(format!("{pw:?}"), "Password(***)");
        assert_eq!(pw.read(), b"hunter2");
        assert!(Password::empty().is_empty());
    }
}
