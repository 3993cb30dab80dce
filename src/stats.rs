use crate::models::{ChartPoint, WellnessEntry, WellnessStats};

/// Days at or above this many steps extend the streak.
pub const STREAK_STEP_THRESHOLD: u32 = 5000;

pub fn build_stats(entries: &[WellnessEntry]) -> WellnessStats {
    if entries.is_empty() {
        return WellnessStats::default();
    }

    let count = entries.len() as f64;
    let mut total_steps = 0u64;
    let mut total_water = 0u64;
    let mut total_exercise = 0u64;
    let mut sleep_sum = 0f64;
    let mut mood_sum = 0u64;

    for entry in entries {
        total_steps = total_steps.saturating_add(u64::from(entry.steps));
        total_water = total_water.saturating_add(u64::from(entry.water));
        total_exercise = total_exercise.saturating_add(u64::from(entry.exercise));
        sleep_sum += entry.sleep;
        mood_sum += u64::from(entry.mood.score());
    }

    WellnessStats {
        total_steps,
        average_sleep: round_tenth(sleep_sum / count),
        average_mood: round_tenth(mood_sum as f64 / count),
        total_water,
        total_exercise,
        streak_days: streak_days(entries),
    }
}

/// Entries counted back from the latest date until one falls short of the
/// step threshold. Gaps between dates do not break the streak.
pub fn streak_days(entries: &[WellnessEntry]) -> u32 {
    let mut newest_first: Vec<&WellnessEntry> = entries.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date));
    newest_first
        .iter()
        .take_while(|entry| entry.steps >= STREAK_STEP_THRESHOLD)
        .count() as u32
}

/// The latest `days` entries by date, oldest first.
pub fn build_chart_data(entries: &[WellnessEntry], days: usize) -> Vec<ChartPoint> {
    let mut newest_first: Vec<&WellnessEntry> = entries.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date));
    newest_first.truncate(days);

    newest_first
        .into_iter()
        .rev()
        .map(|entry| ChartPoint {
            date: entry.date.format("%b %d").to_string(),
            steps: entry.steps,
            sleep: entry.sleep,
            mood: entry.mood.score(),
            water: entry.water,
            exercise: entry.exercise,
        })
        .collect()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use chrono::{Duration, NaiveDate, Utc};

    fn entry(date: NaiveDate, steps: u32, sleep: f64, mood: Mood) -> WellnessEntry {
        let now = Utc::now();
        WellnessEntry {
            id: format!("entry-{date}"),
            date,
            steps,
            sleep,
            mood,
            water: 6,
            exercise: 30,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_entries_give_zero_stats() {
        assert_eq!(build_stats(&[]), WellnessStats::default());
        assert!(build_chart_data(&[], 7).is_empty());
    }

    #[test]
    fn streak_stops_at_first_short_day() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let entries = vec![
            entry(today - Duration::days(2), 4000, 7.0, Mood::Okay),
            entry(today, 6000, 7.0, Mood::Okay),
            entry(today - Duration::days(1), 5200, 7.0, Mood::Okay),
        ];
        assert_eq!(streak_days(&entries), 2);
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let entries = vec![
            entry(today, 1000, 7.0, Mood::Excellent),
            entry(today - Duration::days(1), 2000, 8.0, Mood::Good),
            entry(today - Duration::days(2), 3000, 6.5, Mood::Good),
        ];
        let stats = build_stats(&entries);
        assert_eq!(stats.total_steps, 6000);
        assert_eq!(stats.average_sleep, 7.2);
        assert_eq!(stats.average_mood, 4.3);
        assert_eq!(stats.total_water, 18);
        assert_eq!(stats.total_exercise, 90);
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn chart_keeps_latest_days_in_ascending_order() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let entries: Vec<_> = (0..10)
            .map(|offset| entry(today - Duration::days(offset), 1000 + offset as u32, 7.0, Mood::Poor))
            .collect();

        let chart = build_chart_data(&entries, 7);
        assert_eq!(chart.len(), 7);
        assert_eq!(chart.first().unwrap().date, "Jan 04");
        assert_eq!(chart.last().unwrap().date, "Jan 10");
        assert_eq!(chart.last().unwrap().steps, 1000);
        assert!(chart.iter().all(|point| point.mood == 2));
    }
}
