use crate::{Candidate, PersonRecord, Prize};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),
    #[error("unknown prize {0}")]
    UnknownPrize(String),
    #[error("unknown person {0}")]
    UnknownPerson(u64),
}

/// The persons/prizes collaborator the session reads from and commits to.
pub trait LotteryStore {
    fn all_candidates(&self) -> Vec<Candidate>;
    /// Everyone who has not won anything yet.
    fn remaining_pool(&self) -> Vec<Candidate>;
    /// Everyone who has not won `prize_id`.
    fn pool_excluding_prize_winners(&self, prize_id: &str) -> Vec<Candidate>;
    fn current_prize(&self) -> Option<Prize>;
    fn update_prize(&mut self, prize: &Prize) -> Result<(), StoreError>;
    fn add_winners(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError>;

    /// Records a finished round: the prize's new counts and its winners.
    /// Either both land or neither does; a failed commit can be retried
    /// without recording anyone twice. The default writes the prize first,
    /// so it is only all-or-nothing when `add_winners` cannot fail.
    fn commit_round(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError> {
        self.update_prize(prize)?;
        self.add_winners(winners, prize)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub persons: Vec<PersonRecord>,
    pub prizes: Vec<Prize>,
    pub current_prize_id: Option<String>,
}

impl MemoryStore {
    pub fn new(persons: Vec<PersonRecord>, prizes: Vec<Prize>) -> Self {
        let mut store = Self {
            persons,
            prizes,
            current_prize_id: None,
        };
        store.current_prize_id = store.next_open_prize().map(|prize| prize.id.clone());
        store
    }

    pub fn from_candidates(candidates: Vec<Candidate>, prizes: Vec<Prize>) -> Self {
        Self::new(candidates.into_iter().map(PersonRecord::new).collect(), prizes)
    }

    fn sorted_prizes(&self) -> Vec<&Prize> {
        let mut prizes: Vec<&Prize> = self.prizes.iter().collect();
        prizes.sort_by_key(|prize| prize.sort);
        prizes
    }

    fn next_open_prize(&self) -> Option<&Prize> {
        self.sorted_prizes().into_iter().find(|prize| !prize.is_used)
    }

    pub fn prize(&self, id: &str) -> Option<&Prize> {
        self.prizes.iter().find(|prize| prize.id == id)
    }

    pub fn winners(&self) -> impl Iterator<Item = &PersonRecord> + '_ {
        self.persons.iter().filter(|person| person.is_win)
    }

    /// Makes `id` current and resets it for a fresh series of rounds.
    pub fn select_prize(&mut self, id: &str) -> Result<(), StoreError> {
        let prize = self
            .prizes
            .iter_mut()
            .find(|prize| prize.id == id)
            .ok_or_else(|| StoreError::UnknownPrize(id.to_string()))?;
        prize.reset_for_selection();
        self.current_prize_id = Some(id.to_string());
        log::info!("current prize is now {id}");
        Ok(())
    }

    pub fn toggle_prize(&mut self, id: &str) -> Result<bool, StoreError> {
        let prize = self
            .prizes
            .iter_mut()
            .find(|prize| prize.id == id)
            .ok_or_else(|| StoreError::UnknownPrize(id.to_string()))?;
        prize.toggle_used();
        Ok(prize.is_used)
    }

    /// Returns one winner to the pool.
    pub fn move_to_pool(&mut self, person_id: u64) -> Result<(), StoreError> {
        let person = self
            .persons
            .iter_mut()
            .find(|person| person.candidate.id == person_id)
            .ok_or(StoreError::UnknownPerson(person_id))?;
        person.clear_wins();
        Ok(())
    }

    pub fn reset_winners(&mut self) {
        for person in &mut self.persons {
            person.clear_wins();
        }
    }

    pub fn record_winners_at(
        &mut self,
        winners: &[Candidate],
        prize: &Prize,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_known(winners)?;
        for winner in winners {
            if let Some(person) = self
                .persons
                .iter_mut()
                .find(|person| person.candidate.id == winner.id)
            {
                person.record_win(&prize.id, &prize.name, at);
            }
        }
        Ok(())
    }

    fn check_known(&self, winners: &[Candidate]) -> Result<(), StoreError> {
        match winners
            .iter()
            .find(|winner| !self.persons.iter().any(|p| p.candidate.id == winner.id))
        {
            Some(stranger) => Err(StoreError::UnknownPerson(stranger.id)),
            None => Ok(()),
        }
    }
}

impl LotteryStore for MemoryStore {
    fn all_candidates(&self) -> Vec<Candidate> {
        self.persons.iter().map(|person| person.candidate.clone()).collect()
    }

    fn remaining_pool(&self) -> Vec<Candidate> {
        self.persons
            .iter()
            .filter(|person| !person.is_win)
            .map(|person| person.candidate.clone())
            .collect()
    }

    fn pool_excluding_prize_winners(&self, prize_id: &str) -> Vec<Candidate> {
        self.persons
            .iter()
            .filter(|person| !person.won_prize(prize_id))
            .map(|person| person.candidate.clone())
            .collect()
    }

    fn current_prize(&self) -> Option<Prize> {
        let id = self.current_prize_id.as_deref()?;
        self.prize(id).cloned()
    }

    fn update_prize(&mut self, prize: &Prize) -> Result<(), StoreError> {
        let slot = self
            .prizes
            .iter_mut()
            .find(|existing| existing.id == prize.id)
            .ok_or_else(|| StoreError::UnknownPrize(prize.id.clone()))?;
        *slot = prize.clone();
        let is_current = self.current_prize_id.as_deref() == Some(prize.id.as_str());
        if is_current && prize.is_used {
            if let Some(next) = self.next_open_prize() {
                let next_id = next.id.clone();
                log::info!("prize {} exhausted, advancing to {next_id}", prize.id);
                self.current_prize_id = Some(next_id);
            }
        }
        Ok(())
    }

    fn add_winners(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError> {
        self.record_winners_at(winners, prize, Utc::now())
    }

    fn commit_round(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError> {
        if self.prize(&prize.id).is_none() {
            return Err(StoreError::UnknownPrize(prize.id.clone()));
        }
        self.check_known(winners)?;
        self.update_prize(prize)?;
        self.add_winners(winners, prize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let persons = (1..=5).map(|id| Candidate::new(id, format!("P{id}"))).collect();
        let mut first = Prize::new("a", "First", 2);
        first.sort = 2;
        let mut second = Prize::new("b", "Second", 3);
        second.sort = 1;
        MemoryStore::from_candidates(persons, vec![first, second])
    }

    #[test]
    fn current_prize_starts_at_lowest_sort() {
        assert_eq!(store().current_prize().map(|p| p.id), Some("b".to_string()));
    }

    #[test]
    fn pools_follow_winner_records() {
        let mut store = store();
        let prize = store.current_prize().expect("prize");
        let winners = vec![Candidate::new(1, "P1"), Candidate::new(2, "P2")];
        store.add_winners(&winners, &prize).expect("add");
        assert_eq!(store.remaining_pool().len(), 3);
        assert_eq!(store.pool_excluding_prize_winners("b").len(), 3);
        assert_eq!(store.pool_excluding_prize_winners("a").len(), 5);
        let record = &store.persons[0];
        assert_eq!(record.prize_name, vec!["Second".to_string()]);
        assert_eq!(record.prize_time.len(), 1);

        store.move_to_pool(1).expect("known");
        assert_eq!(store.remaining_pool().len(), 4);
        store.reset_winners();
        assert_eq!(store.winners().count(), 0);
    }

    #[test]
    fn exhausting_current_prize_advances() {
        let mut store = store();
        let mut prize = store.current_prize().expect("prize");
        prize.commit(3);
        store.update_prize(&prize).expect("update");
        assert_eq!(store.current_prize_id.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut store = store();
        assert_eq!(
            store.select_prize("zzz"),
            Err(StoreError::UnknownPrize("zzz".into()))
        );
        assert_eq!(store.move_to_pool(99), Err(StoreError::UnknownPerson(99)));
        let ghost = Prize::new("ghost", "Ghost", 1);
        assert!(store.update_prize(&ghost).is_err());
    }

    #[test]
    fn commit_with_a_stranger_changes_nothing() {
        let mut store = store();
        let mut prize = store.current_prize().expect("prize");
        prize.commit(2);
        let winners = vec![Candidate::new(1, "P1"), Candidate::new(77, "Nobody")];
        assert_eq!(
            store.commit_round(&winners, &prize),
            Err(StoreError::UnknownPerson(77))
        );
        assert_eq!(store.winners().count(), 0);
        assert_eq!(store.prize("b").expect("prize").is_used_count, 0);

        let winners = &winners[..1];
        store.commit_round(winners, &prize).expect("commit");
        assert_eq!(store.winners().count(), 1);
        assert_eq!(store.prize("b").expect("prize").is_used_count, 2);
    }

    #[test]
    fn select_and_toggle() {
        let mut store = store();
        store.select_prize("a").expect("select");
        let current = store.current_prize().expect("prize");
        assert_eq!(current.id, "a");
        assert_eq!(current.leftover(), 2);
        assert!(store.toggle_prize("a").expect("toggle"));
        assert!(store.current_prize().expect("prize").is_used);
    }
}
