use crate::model::PodKey;
use tracing::debug;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LogToken(u64);

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogRequest {
    pub token: LogToken,
    pub target: PodKey,
    pub tail: u32,
}

#[derive(Debug, Clone)]
pub struct LogSession {
    target: Option<PodKey>,
    loading: bool,
    failed: bool,
    text: String,
    generation: u64,
    tail: u32,
}

impl LogSession {
    pub fn new(tail: u32) -> Self {
        Self {
            target: None,
            loading: false,
            failed: false,
            text: String::new(),
            generation: 0,
            tail,
        }
    }

    pub fn open(&mut self, target: PodKey) -> LogRequest {
        self.generation = self.generation.wrapping_add(1);
        self.target = Some(target.clone());
        self.loading = true;
        self.failed = false;
        self.text.clear();
        LogRequest {
            token: LogToken(self.generation),
            target,
            tail: self.tail,
        }
    }

    pub fn resolve(&mut self, token: LogToken, result: Result<String, String>) -> bool {
        if self.target.is_none() || token.0 != self.generation {
            debug!(stale = token.0, current = self.generation, "dropping log response");
            return false;
        }

        self.loading = false;
        match result {
            Ok(text) => {
                self.failed = false;
                self.text = text;
            }
            Err(reason) => {
                self.failed = true;
                self.text = format!("Failed to load logs: {reason}");
            }
        }
        true
    }

    pub fn close(&mut self) {
        self.target = None;
        self.loading = false;
        self.failed = false;
        self.text.clear();
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn target(&self) -> Option<&PodKey> {
        self.target.as_ref()
    }

    pub fn tail(&self) -> u32 {
        self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::LogSession;
    use crate::model::PodKey;

    #[test]
    fn open_sets_loading_and_clears_text_synchronously() {
        let mut session = LogSession::new(100);
        let first = session.open(PodKey::new("default", "old"));
        session.resolve(first.token, Ok("old output".to_string()));
        assert_eq!(session.text(), "old output");

        let request = session.open(PodKey::new("default", "web-1"));
        assert!(session.is_open());
        assert!(session.is_loading());
        assert_eq!(session.text(), "");
        assert_eq!(request.target, PodKey::new("default", "web-1"));
        assert_eq!(request.tail, 100);
    }

    #[test]
    fn stale_response_cannot_overwrite_newer_session() {
        let mut session = LogSession::new(50);
        let slow = session.open(PodKey::new("default", "a"));
        let fast = session.open(PodKey::new("default", "b"));

        assert!(session.resolve(fast.token, Ok("b logs".to_string())));
        assert!(!session.resolve(slow.token, Ok("a logs".to_string())));
        assert_eq!(session.text(), "b logs");
        assert_eq!(session.target(), Some(&PodKey::new("default", "b")));
    }

    #[test]
    fn failure_shows_placeholder_text() {
        let mut session = LogSession::new(100);
        let request = session.open(PodKey::new("default", "web-1"));
        assert!(session.resolve(request.token, Err("HTTP 404".to_string())));
        assert!(!session.is_loading());
        assert!(session.failed());
        assert_eq!(session.text(), "Failed to load logs: HTTP 404");
    }

    #[test]
    fn close_discards_state_and_late_response() {
        let mut session = LogSession::new(100);
        let request = session.open(PodKey::new("default", "web-1"));
        session.close();
        assert!(!session.is_open());
        assert!(!session.is_loading());

        assert!(!session.resolve(request.token, Ok("late".to_string())));
        assert_eq!(session.text(), "");
    }
}
