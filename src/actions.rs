use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ActionTracker<K> {
    in_flight: HashMap<K, bool>,
    last_error: Option<String>,
}

impl<K> Default for ActionTracker<K> {
    fn default() -> Self {
        Self {
            in_flight: HashMap::new(),
            last_error: None,
        }
    }
}

impl<K> ActionTracker<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    pub fn try_begin(&mut self, key: &K) -> bool {
        if self.is_in_flight(key) {
            debug!(?key, "action already in flight");
            return false;
        }
        self.in_flight.insert(key.clone(), true);
        self.last_error = None;
        true
    }

    pub fn finish_ok(&mut self, key: &K) {
        self.in_flight.insert(key.clone(), false);
    }

    pub fn finish_err(&mut self, key: &K, message: impl Into<String>) {
        let message = message.into();
        warn!(?key, %message, "action failed");
        self.in_flight.insert(key.clone(), false);
        self.last_error = Some(message);
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.get(key).copied().unwrap_or(false)
    }

    pub fn any_in_flight(&self) -> bool {
        self.in_flight.values().any(|busy| *busy)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.last_error.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::ActionTracker;
    use crate::model::WorkloadKey;

    fn key(name: &str) -> WorkloadKey {
        WorkloadKey::new("prod", name, "Deployment")
    }

    #[test]
    fn in_flight_flags_are_isolated_per_key() {
        let mut tracker = ActionTracker::default();
        assert!(tracker.try_begin(&key("api")));
        assert!(tracker.is_in_flight(&key("api")));
        assert!(!tracker.is_in_flight(&key("worker")));
        assert!(tracker.try_begin(&key("worker")));

        tracker.finish_ok(&key("api"));
        assert!(!tracker.is_in_flight(&key("api")));
        assert!(tracker.is_in_flight(&key("worker")));
    }

    #[test]
    fn same_kind_in_other_namespace_is_a_different_row() {
        let mut tracker = ActionTracker::default();
        assert!(tracker.try_begin(&key("api")));
        let staging = WorkloadKey::new("staging", "api", "Deployment");
        assert!(tracker.try_begin(&staging));
    }

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let mut tracker = ActionTracker::default();
        assert!(tracker.try_begin(&key("api")));
        assert!(!tracker.try_begin(&key("api")));

        tracker.finish_err(&key("api"), "boom");
        assert!(tracker.try_begin(&key("api")));
    }

    #[test]
    fn failure_sets_banner_and_success_of_other_key_keeps_it() {
        let mut tracker = ActionTracker::default();
        tracker.try_begin(&key("a"));
        tracker.try_begin(&key("b"));

        tracker.finish_err(&key("a"), "quota exceeded");
        assert_eq!(tracker.last_error(), Some("quota exceeded"));
        tracker.finish_ok(&key("b"));
        assert_eq!(tracker.last_error(), Some("quota exceeded"));
        assert!(!tracker.any_in_flight());

        assert!(tracker.dismiss_error());
        assert_eq!(tracker.last_error(), None);
        assert!(!tracker.dismiss_error());
    }

    #[test]
    fn later_failure_overwrites_earlier_message() {
        let mut tracker = ActionTracker::default();
        tracker.try_begin(&key("a"));
        tracker.finish_err(&key("a"), "first");
        tracker.try_begin(&key("b"));
        tracker.finish_err(&key("b"), "second");
        assert_eq!(tracker.last_error(), Some("second"));
    }
}
