use gazette_api_types::SessionUserResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub photo: String,
}

impl From<SessionUserResponse> for User {
    fn from(user: SessionUserResponse) -> Self {
        Self {
            name: user.name,
            email: user.email,
            photo: user.photo,
        }
    }
}

/// Who is signed in on this client.
///
/// A session starts empty, is filled by a successful sign-in and emptied
/// again by `clear`. Views read it; they never hold their own copy of the user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn clear(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_starts_empty_and_clears() {
        let mut session = Session::new();
        assert!(!session.is_signed_in());

        session.sign_in(User {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo: String::new(),
        });
        assert_eq!(session.user().map(|u| u.name.as_str()), Some("Ada"));

        session.clear();
        assert!(session.user().is_none());
    }
}
