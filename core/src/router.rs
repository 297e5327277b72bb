use deck_common::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Landing,
    Generating,
}

/// Which screen is showing and which session it tracks.
#[derive(Debug, Clone, Default)]
pub struct ViewRouter {
    view: View,
    session: Option<SessionId>,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// landing -> generating
    pub fn start_generation(&mut self, session_id: SessionId) {
        self.view = View::Generating;
        self.session = Some(session_id);
    }

    /// generating -> landing; the session is forgotten.
    pub fn back(&mut self) {
        self.view = View::Landing;
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_back() {
        let mut router = ViewRouter::new();
        assert_eq!(router.view(), View::Landing);
        assert!(router.session().is_none());

        router.start_generation(SessionId::new("abc123").unwrap());
        assert_eq!(router.view(), View::Generating);
        assert_eq!(router.session().map(SessionId::as_str), Some("abc123"));

        router.back();
        assert_eq!(router.view(), View::Landing);
        assert!(router.session().is_none());
    }
}
