use crate::load::{load_store, save_store};
use luckydraw_core::{Candidate, LotteryStore, MemoryStore, Prize, StoreError};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// A [`MemoryStore`] that writes itself back to its data directory after
/// every mutation.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            inner: load_store(dir)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self) -> anyhow::Result<()> {
        save_store(&self.dir, &self.inner)
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.save().map_err(|err| {
            log::error!("saving {} failed: {err:#}", self.dir.display());
            StoreError::Backend(format!("{err:#}"))
        })
    }

    /// Runs `change` and saves; memory is rolled back if either step fails.
    fn apply<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let before = self.inner.clone();
        let result = change(&mut self.inner).and_then(|value| {
            self.persist()?;
            Ok(value)
        });
        if result.is_err() {
            self.inner = before;
        }
        result
    }

    pub fn select_prize(&mut self, id: &str) -> Result<(), StoreError> {
        self.apply(|store| store.select_prize(id))
    }

    pub fn toggle_prize(&mut self, id: &str) -> Result<bool, StoreError> {
        self.apply(|store| store.toggle_prize(id))
    }

    pub fn move_to_pool(&mut self, person_id: u64) -> Result<(), StoreError> {
        self.apply(|store| store.move_to_pool(person_id))
    }

    pub fn reset_winners(&mut self) -> Result<(), StoreError> {
        self.apply(|store| {
            store.reset_winners();
            Ok(())
        })
    }
}

impl Deref for FileStore {
    type Target = MemoryStore;

    fn deref(&self) -> &MemoryStore {
        &self.inner
    }
}

impl LotteryStore for FileStore {
    fn all_candidates(&self) -> Vec<Candidate> {
        self.inner.all_candidates()
    }

    fn remaining_pool(&self) -> Vec<Candidate> {
        self.inner.remaining_pool()
    }

    fn pool_excluding_prize_winners(&self, prize_id: &str) -> Vec<Candidate> {
        self.inner.pool_excluding_prize_winners(prize_id)
    }

    fn current_prize(&self) -> Option<Prize> {
        self.inner.current_prize()
    }

    fn update_prize(&mut self, prize: &Prize) -> Result<(), StoreError> {
        self.apply(|store| store.update_prize(prize))
    }

    fn add_winners(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError> {
        self.apply(|store| store.add_winners(winners, prize))
    }

    fn commit_round(&mut self, winners: &[Candidate], prize: &Prize) -> Result<(), StoreError> {
        self.apply(|store| store.commit_round(winners, prize))
    }
}
