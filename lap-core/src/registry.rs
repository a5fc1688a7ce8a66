//! Runner roster and per-runner lap records.

use std::fmt;

use thiserror::Error;

use crate::clock::Clock;

/// Stable identity for a runner. Allocated from a monotonic counter and
/// never reused, so a held id either resolves to the same runner or to
/// nothing at all once that runner is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunnerId(u64);

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap {
    /// 1-based position within the owning runner's sequence.
    pub index: u32,
    /// Clock elapsed time at the moment the lap was recorded.
    pub absolute_ms: u64,
    /// Time since this runner's previous lap; the absolute time itself
    /// for the first lap.
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Runner {
    id: RunnerId,
    name: String,
    laps: Vec<Lap>,
}

impl Runner {
    pub fn id(&self) -> RunnerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Laps in recording order. Append-only: there is no edit or
    /// reorder operation anywhere.
    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Display total: frozen at the last lap's absolute time, zero when
    /// no lap has been recorded. Deliberately not the live clock.
    pub fn total_ms(&self) -> u64 {
        self.laps.last().map(|lap| lap.absolute_ms).unwrap_or(0)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Lap recording is only meaningful while the clock advances.
    #[error("clock is not running")]
    NotRunning,
    #[error("no runner with id {0}")]
    NotFound(RunnerId),
}

/// Ordered collection of runners sharing one clock. The registry reads
/// the clock's elapsed time while recording laps but never mutates it.
#[derive(Debug, Default)]
pub struct Registry {
    runners: Vec<Runner>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `raw` on whitespace and create one runner per token, in
    /// input order, each with an empty lap list. Returns the newly
    /// created runners; input with no tokens yields an empty slice and
    /// changes nothing. Duplicate names are allowed, identity is by id.
    pub fn add_runners(&mut self, raw: &str) -> &[Runner] {
        let first_new = self.runners.len();
        for name in raw.split_whitespace() {
            let id = RunnerId(self.next_id);
            self.next_id += 1;
            self.runners.push(Runner {
                id,
                name: name.to_string(),
                laps: Vec::new(),
            });
        }
        &self.runners[first_new..]
    }

    /// Record a lap for `id` at the clock's current elapsed time.
    ///
    /// Rejected without any state change while the clock is stopped, so
    /// a lap can never refer to a frozen timeline.
    pub fn record_lap(
        &mut self,
        id: RunnerId,
        clock: &Clock,
        now_ms: u64,
    ) -> Result<Lap, RegistryError> {
        if !clock.is_running() {
            return Err(RegistryError::NotRunning);
        }
        let absolute_ms = clock.elapsed_ms(now_ms);
        let runner = self
            .runner_mut(id)
            .ok_or(RegistryError::NotFound(id))?;
        let duration_ms = match runner.laps.last() {
            Some(prev) => absolute_ms.saturating_sub(prev.absolute_ms),
            None => absolute_ms,
        };
        let lap = Lap {
            index: runner.laps.len() as u32 + 1,
            absolute_ms,
            duration_ms,
        };
        runner.laps.push(lap);
        Ok(lap)
    }

    /// Permanently remove a runner together with its laps. There is no
    /// undo; callers are expected to confirm first via [`Registry::runner`].
    pub fn delete_runner(&mut self, id: RunnerId) -> Result<Runner, RegistryError> {
        let pos = self
            .runners
            .iter()
            .position(|r| r.id == id)
            .ok_or(RegistryError::NotFound(id))?;
        Ok(self.runners.remove(pos))
    }

    pub fn runner(&self, id: RunnerId) -> Option<&Runner> {
        self.runners.iter().find(|r| r.id == id)
    }

    fn runner_mut(&mut self, id: RunnerId) -> Option<&mut Runner> {
        self.runners.iter_mut().find(|r| r.id == id)
    }

    /// Ordered read-only view of the roster.
    pub fn runners(&self) -> &[Runner] {
        &self.runners
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Erase every runner's laps while keeping the roster. Used when the
    /// clock is reset: recorded absolute times would otherwise outrun a
    /// zeroed clock and the split durations would stop telescoping.
    pub fn clear_laps(&mut self) {
        for runner in &mut self.runners {
            runner.laps.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_clock(started_at_ms: u64) -> Clock {
        let mut clock = Clock::new();
        clock.start(started_at_ms);
        clock
    }

    #[test]
    fn test_add_runners_tokenization() {
        let mut reg = Registry::new();
        let created: Vec<String> = reg
            .add_runners("Alice Bob  Carol")
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(created, ["Alice", "Bob", "Carol"]);
        assert_eq!(reg.len(), 3);
        assert!(reg.runners().iter().all(|r| r.laps().is_empty()));
    }

    #[test]
    fn test_add_runners_blank_input_is_noop() {
        let mut reg = Registry::new();
        assert!(reg.add_runners("   ").is_empty());
        assert!(reg.add_runners("").is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_add_runners_duplicate_names_get_distinct_ids() {
        let mut reg = Registry::new();
        let ids: Vec<RunnerId> = reg.add_runners("Sam Sam").iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_lap_sequence_invariant() {
        let mut reg = Registry::new();
        let clock = running_clock(0);
        let id = reg.add_runners("A")[0].id();

        for now in [500, 1200, 1200, 4000, 9999] {
            reg.record_lap(id, &clock, now).unwrap();
        }

        let laps = reg.runner(id).unwrap().laps();
        assert_eq!(laps.len(), 5);
        let mut sum = 0;
        for (i, lap) in laps.iter().enumerate() {
            assert_eq!(lap.index, i as u32 + 1);
            sum += lap.duration_ms;
            assert_eq!(sum, lap.absolute_ms);
        }
        assert_eq!(laps[0].duration_ms, 500);
        assert_eq!(laps[1].duration_ms, 700);
        assert_eq!(laps[2].duration_ms, 0); // same instant, zero split
    }

    #[test]
    fn test_lap_rejected_while_stopped() {
        let mut reg = Registry::new();
        let mut clock = Clock::new();
        let id = reg.add_runners("A")[0].id();

        assert_eq!(
            reg.record_lap(id, &clock, 500),
            Err(RegistryError::NotRunning)
        );

        clock.start(0);
        clock.pause(800);
        assert_eq!(
            reg.record_lap(id, &clock, 900),
            Err(RegistryError::NotRunning)
        );
        assert!(reg.runner(id).unwrap().laps().is_empty());
    }

    #[test]
    fn test_lap_for_unknown_runner() {
        let mut reg = Registry::new();
        let clock = running_clock(0);
        let id = reg.add_runners("A")[0].id();
        reg.delete_runner(id).unwrap();

        assert_eq!(
            reg.record_lap(id, &clock, 100),
            Err(RegistryError::NotFound(id))
        );
    }

    #[test]
    fn test_delete_is_permanent() {
        let mut reg = Registry::new();
        let clock = running_clock(0);
        let ids: Vec<RunnerId> = reg.add_runners("A B").iter().map(|r| r.id()).collect();
        reg.record_lap(ids[0], &clock, 400).unwrap();

        let removed = reg.delete_runner(ids[0]).unwrap();
        assert_eq!(removed.name(), "A");
        assert_eq!(removed.laps().len(), 1);

        assert!(reg.runner(ids[0]).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.delete_runner(ids[0]).unwrap_err(),
            RegistryError::NotFound(ids[0])
        );
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut reg = Registry::new();
        let first = reg.add_runners("A")[0].id();
        reg.delete_runner(first).unwrap();
        let second = reg.add_runners("B")[0].id();
        assert_ne!(first, second);
    }

    #[test]
    fn test_clear_laps_keeps_roster() {
        let mut reg = Registry::new();
        let clock = running_clock(0);
        let id = reg.add_runners("A B C")[0].id();
        reg.record_lap(id, &clock, 250).unwrap();

        reg.clear_laps();
        assert_eq!(reg.len(), 3);
        assert!(reg.runners().iter().all(|r| r.laps().is_empty()));
        assert_eq!(reg.runner(id).unwrap().total_ms(), 0);
    }

    #[test]
    fn test_total_freezes_at_last_lap() {
        let mut reg = Registry::new();
        let clock = running_clock(0);
        let id = reg.add_runners("A")[0].id();
        assert_eq!(reg.runner(id).unwrap().total_ms(), 0);

        reg.record_lap(id, &clock, 1500).unwrap();
        // Clock keeps running; the displayed total does not follow it.
        assert_eq!(clock.elapsed_ms(9000), 9000);
        assert_eq!(reg.runner(id).unwrap().total_ms(), 1500);
    }

    // The end-to-end walk from the original widget: start, add two
    // runners, two laps for one of them, pause, resume.
    #[test]
    fn test_session_scenario() {
        let mut reg = Registry::new();
        let mut clock = Clock::new();
        clock.start(0);

        let ids: Vec<RunnerId> = reg.add_runners("A B").iter().map(|r| r.id()).collect();

        let lap1 = reg.record_lap(ids[0], &clock, 500).unwrap();
        assert_eq!(lap1.duration_ms, 500);

        let lap2 = reg.record_lap(ids[0], &clock, 1200).unwrap();
        assert_eq!(lap2.duration_ms, 700);
        assert_eq!(lap2.absolute_ms, 1200);

        clock.pause(1200);
        assert_eq!(clock.elapsed_ms(50_000), 1200);
        assert!(reg.runner(ids[1]).unwrap().laps().is_empty());

        clock.start(60_000);
        assert_eq!(clock.elapsed_ms(60_100), 1300); // continues, not from 0
    }
}
