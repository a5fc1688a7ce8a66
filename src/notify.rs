use std::collections::VecDeque;
use std::time::{Duration, Instant};

const NOTICE_TTL: Duration = Duration::from_secs(3);

struct Notice {
    text: String,
    expires_at: Instant,
}

/// Transient feedback line shown in the board footer: "Added runner X",
/// "Lap 3 for X", and so on. Newest notice wins; expired ones are pruned
/// lazily on read. Time is passed in so tests never sleep.
#[derive(Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: String, now: Instant) {
        self.queue.push_back(Notice {
            text,
            expires_at: now + NOTICE_TTL,
        });
    }

    /// The notice to display, if any is still alive.
    pub fn active(&mut self, now: Instant) -> Option<&str> {
        while let Some(front) = self.queue.front() {
            if front.expires_at <= now {
                self.queue.pop_front();
            } else {
                break;
            }
        }
        // Show the most recent notice rather than draining one at a time
        self.queue.back().map(|n| n.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires() {
        let t0 = Instant::now();
        let mut notices = Notices::new();
        notices.push("Added runner Alice".to_string(), t0);

        assert_eq!(notices.active(t0), Some("Added runner Alice"));
        assert_eq!(
            notices.active(t0 + Duration::from_millis(2999)),
            Some("Added runner Alice")
        );
        assert_eq!(notices.active(t0 + Duration::from_secs(3)), None);
    }

    #[test]
    fn test_newest_notice_wins() {
        let t0 = Instant::now();
        let mut notices = Notices::new();
        notices.push("Lap 1 for A".to_string(), t0);
        notices.push("Lap 1 for B".to_string(), t0 + Duration::from_millis(100));

        assert_eq!(
            notices.active(t0 + Duration::from_millis(200)),
            Some("Lap 1 for B")
        );
        // The older notice expires first, the newer one stays visible
        assert_eq!(
            notices.active(t0 + Duration::from_millis(3050)),
            Some("Lap 1 for B")
        );
        assert_eq!(notices.active(t0 + Duration::from_secs(4)), None);
    }
}
