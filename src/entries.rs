use crate::errors::StoreError;
use crate::models::{ChartPoint, EntryUpdate, Mood, NewEntry, WellnessEntry, WellnessStats};
use crate::stats::{build_chart_data, build_stats};
use crate::storage::{ENTRIES_KEY, LocalStorage};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use tracing::{debug, info};

pub const DEMO_HISTORY_DAYS: i64 = 30;

/// Wellness entries, at most one per date, written back in full on every
/// change.
pub struct EntryStore {
    storage: LocalStorage,
    entries: Vec<WellnessEntry>,
}

impl EntryStore {
    /// Reads the stored list. When nothing is stored yet and `seed_demo` is
    /// set, a month of demo history is generated and saved.
    pub async fn load(storage: LocalStorage, seed_demo: bool) -> Result<Self, StoreError> {
        let entries = match storage.read_json::<Vec<WellnessEntry>>(ENTRIES_KEY).await? {
            Some(entries) => entries,
            None if seed_demo => {
                let entries = generate_demo_entries(Utc::now(), &mut rand::thread_rng());
                storage.write_json(ENTRIES_KEY, &entries).await?;
                info!(count = entries.len(), "seeded demo history");
                entries
            }
            None => Vec::new(),
        };

        Ok(Self { storage, entries })
    }

    pub fn entries(&self) -> &[WellnessEntry] {
        &self.entries
    }

    /// Newest date first.
    pub fn list_entries(&self) -> Vec<WellnessEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    pub async fn add_entry(&mut self, data: NewEntry) -> Result<WellnessEntry, StoreError> {
        validate_sleep(data.sleep)?;
        if self.get_entry_by_date(data.date).is_some() {
            return Err(StoreError::DuplicateDate(data.date));
        }

        let now = Utc::now();
        let entry = WellnessEntry {
            id: format!("entry-{}", uuid::Uuid::new_v4().simple()),
            date: data.date,
            steps: data.steps,
            sleep: data.sleep,
            mood: data.mood,
            water: data.water,
            exercise: data.exercise,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.entries.clone();
        next.push(entry.clone());
        self.commit(next).await?;
        info!(id = %entry.id, date = %entry.date, "entry added");
        Ok(entry)
    }

    /// Merges `update` into the entry with `id`. Returns `None` when there is
    /// no such entry.
    pub async fn update_entry(
        &mut self,
        id: &str,
        update: EntryUpdate,
    ) -> Result<Option<WellnessEntry>, StoreError> {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            debug!(id, "update for unknown entry");
            return Ok(None);
        };
        if let Some(sleep) = update.sleep {
            validate_sleep(sleep)?;
        }
        if let Some(date) = update.date {
            let taken = self
                .entries
                .iter()
                .any(|entry| entry.date == date && entry.id != id);
            if taken {
                return Err(StoreError::DuplicateDate(date));
            }
        }

        let mut next = self.entries.clone();
        let entry = &mut next[index];
        if let Some(date) = update.date {
            entry.date = date;
        }
        if let Some(steps) = update.steps {
            entry.steps = steps;
        }
        if let Some(sleep) = update.sleep {
            entry.sleep = sleep;
        }
        if let Some(mood) = update.mood {
            entry.mood = mood;
        }
        if let Some(water) = update.water {
            entry.water = water;
        }
        if let Some(exercise) = update.exercise {
            entry.exercise = exercise;
        }
        if let Some(notes) = update.notes {
            entry.notes = Some(notes).filter(|notes| !notes.is_empty());
        }
        entry.updated_at = Utc::now();
        let updated = entry.clone();

        self.commit(next).await?;
        info!(id, "entry updated");
        Ok(Some(updated))
    }

    pub async fn delete_entry(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.entries.iter().any(|entry| entry.id == id) {
            debug!(id, "delete for unknown entry");
            return Ok(());
        }
        let next = self
            .entries
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect();
        self.commit(next).await?;
        info!(id, "entry deleted");
        Ok(())
    }

    pub fn get_entry_by_date(&self, date: NaiveDate) -> Option<&WellnessEntry> {
        self.entries.iter().find(|entry| entry.date == date)
    }

    pub fn get_stats(&self) -> WellnessStats {
        build_stats(&self.entries)
    }

    pub fn get_chart_data(&self, days: usize) -> Vec<ChartPoint> {
        build_chart_data(&self.entries, days)
    }

    /// Replaces the list only once `next` is stored.
    async fn commit(&mut self, next: Vec<WellnessEntry>) -> Result<(), StoreError> {
        self.storage.write_json(ENTRIES_KEY, &next).await?;
        self.entries = next;
        Ok(())
    }
}

fn validate_sleep(sleep: f64) -> Result<(), StoreError> {
    if !sleep.is_finite() || sleep < 0.0 {
        return Err(StoreError::InvalidField {
            field: "sleep",
            reason: "must be a non-negative number of hours",
        });
    }
    Ok(())
}

/// One entry per day for the `DEMO_HISTORY_DAYS` days ending at `now`,
/// oldest first.
pub fn generate_demo_entries(now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<WellnessEntry> {
    (0..DEMO_HISTORY_DAYS)
        .rev()
        .map(|offset| {
            let at = now - Duration::days(offset);
            WellnessEntry {
                id: format!("entry-{offset}"),
                date: at.date_naive(),
                steps: rng.gen_range(3000..8000),
                sleep: f64::from(rng.gen_range(6..=8u8)),
                mood: Mood::ALL[rng.gen_range(0..Mood::ALL.len())],
                water: rng.gen_range(4..8),
                exercise: rng.gen_range(20..80),
                notes: rng
                    .gen_bool(0.3)
                    .then(|| "Had a great day!".to_string()),
                created_at: at,
                updated_at: at,
            }
        })
        .collect()
}
