use crate::errors::TourError;

/// The single demo account. Exact string match, no hashing, no sessions:
/// this gates the wizard, it is not a security boundary.
#[derive(Debug, Clone)]
pub struct AuthGate {
    username: String,
    password: String,
}

impl AuthGate {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(), TourError> {
        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(TourError::InvalidCredentials)
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new("demo", "tour123")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_demo_pair_passes() {
        let gate = AuthGate::default();
        assert!(gate.login("demo", "tour123").is_ok());
        for (u, p) in [("demo", "tour1234"), ("Demo", "tour123"), ("", ""), ("admin", "tour123"), ("demo ", "tour123")] {
            assert_eq!(gate.login(u, p), Err(TourError::InvalidCredentials), "{u}/{p}");
        }
    }
}
