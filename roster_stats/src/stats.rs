use std::collections::{HashMap, HashSet};

use log::debug;

use crate::calendar::{date_label, CampaignWindow};
use crate::config::{AggregateBucket, DateRoster, IdentityKey, MaxAttendance, ParticipantRecord};

pub const GENDER_LABELS: [&str; 2] = ["형제", "자매"];

pub const MARITAL_STATUS_LABELS: [&str; 2] = ["기혼", "미혼"];

pub const AGE_BRACKET_LABELS: [&str; 7] =
    ["10대", "20대", "30대", "40대", "50대", "60대", "70대 이상"];

/// Keeps the first record of each identity.
///
/// The canonical list is already unique, but projections of it may not be.
pub fn dedup_by_identity(records: &[ParticipantRecord]) -> Vec<&ParticipantRecord> {
    let mut seen: HashSet<&IdentityKey> = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(&r.identity))
        .collect()
}

// Counts the records for each of the given labels, in the order of the labels.
fn count_labels<'a, F>(records: &[&'a ParticipantRecord], labels: &[&str], f: F) -> Vec<AggregateBucket>
where
    F: Fn(&'a ParticipantRecord) -> Option<&'a str>,
{
    let mut buckets: Vec<AggregateBucket> =
        labels.iter().map(|l| AggregateBucket::new(l, 0)).collect();
    for r in records.iter() {
        if let Some(v) = f(r) {
            if let Some(b) = buckets.iter_mut().find(|b| b.label == v) {
                b.count += 1;
            }
        }
    }
    buckets
}

pub fn gender_counts(records: &[ParticipantRecord]) -> Vec<AggregateBucket> {
    count_labels(&dedup_by_identity(records), &GENDER_LABELS, |r| {
        Some(r.gender())
    })
}

pub fn marital_status_counts(records: &[ParticipantRecord]) -> Vec<AggregateBucket> {
    count_labels(&dedup_by_identity(records), &MARITAL_STATUS_LABELS, |r| {
        r.marital_status.as_deref()
    })
}

fn age_bracket(age: i32) -> Option<usize> {
    match age {
        a if a < 10 => None,
        a if a >= 70 => Some(6),
        a => Some((a / 10 - 1) as usize),
    }
}

/// Participants by decade of age. Unknown ages and ages under 10 are not counted.
pub fn age_brackets(records: &[ParticipantRecord]) -> Vec<AggregateBucket> {
    let mut buckets: Vec<AggregateBucket> = AGE_BRACKET_LABELS
        .iter()
        .map(|l| AggregateBucket::new(l, 0))
        .collect();
    for r in dedup_by_identity(records) {
        if let Some(idx) = r.age.and_then(age_bracket) {
            buckets[idx].count += 1;
        }
    }
    buckets
}

/// Participants by number of attended days, from `1일` to `{max}일`.
pub fn attendance_histogram(records: &[ParticipantRecord], max: usize) -> Vec<AggregateBucket> {
    let mut buckets: Vec<AggregateBucket> = (1..=max)
        .map(|n| AggregateBucket::new(&format!("{}일", n), 0))
        .collect();
    for r in dedup_by_identity(records) {
        let n = r.attendance_count();
        if n >= 1 && n <= max {
            buckets[n - 1].count += 1;
        }
    }
    buckets
}

// Counts per key, in order of first appearance, then sorts by decreasing count.
// The sort is stable: equal counts stay in order of first appearance.
fn count_sorted<'a, I>(keys: I) -> Vec<AggregateBucket>
where
    I: Iterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<AggregateBucket> = Vec::new();
    for k in keys {
        match index.get(k) {
            Some(idx) => buckets[*idx].count += 1,
            None => {
                index.insert(k, buckets.len());
                buckets.push(AggregateBucket::new(k, 1));
            }
        }
    }
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

/// The `top_n` affiliations with the most participants.
///
/// The rank is the position in the list: two affiliations with the same count get
/// different ranks. See `shared_ranks` for the tie-aware version.
pub fn affiliation_ranking(records: &[ParticipantRecord], top_n: usize) -> Vec<AggregateBucket> {
    let mut buckets = count_sorted(
        dedup_by_identity(records)
            .into_iter()
            .map(|r| r.affiliation())
            .filter(|a| !a.is_empty()),
    );
    buckets.truncate(top_n);
    for (idx, b) in buckets.iter_mut().enumerate() {
        b.rank = Some((idx + 1) as u32);
    }
    buckets
}

/// Re-ranks buckets so that equal counts share the same rank (1, 1, 3).
///
/// This is the ranking shown to readers. It is kept apart from the positional
/// ranks of `affiliation_ranking`, which some consumers rely on.
pub fn shared_ranks(buckets: &[AggregateBucket]) -> Vec<AggregateBucket> {
    let mut sorted: Vec<AggregateBucket> = buckets.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    let mut current_rank: u32 = 0;
    let mut previous: Option<u64> = None;
    for (idx, b) in sorted.iter_mut().enumerate() {
        if previous != Some(b.count) {
            current_rank = (idx + 1) as u32;
            previous = Some(b.count);
        }
        b.rank = Some(current_rank);
    }
    sorted
}

/// Participants per region, the region being the prefix of the affiliation name.
pub fn region_rollup(records: &[ParticipantRecord], regions: &[String]) -> Vec<AggregateBucket> {
    count_sorted(dedup_by_identity(records).into_iter().filter_map(|r| {
        regions
            .iter()
            .find(|region| r.affiliation().starts_with(region.as_str()))
            .map(|s| s.as_str())
    }))
}

/// Mean of the known ages, with one decimal. "0" if no age is known.
pub fn average_age(records: &[ParticipantRecord]) -> String {
    let ages: Vec<i32> = dedup_by_identity(records)
        .into_iter()
        .filter_map(|r| r.age)
        .collect();
    if ages.is_empty() {
        return "0".to_string();
    }
    let sum: i64 = ages.iter().map(|a| *a as i64).sum();
    format!("{:.1}", sum as f64 / ages.len() as f64)
}

/// The participants present on each day of the campaign, in the order of the days.
///
/// Days without anyone still get an (empty) roster. Dates outside the window are ignored.
pub fn participants_by_date<'a>(
    records: &'a [ParticipantRecord],
    window: &CampaignWindow,
) -> Vec<DateRoster<'a>> {
    let mut rosters: Vec<DateRoster<'a>> = window
        .dates()
        .into_iter()
        .map(|date| DateRoster {
            label: date_label(date),
            date,
            participants: Vec::new(),
        })
        .collect();
    let index: HashMap<String, usize> = rosters
        .iter()
        .enumerate()
        .map(|(idx, r)| (r.label.clone(), idx))
        .collect();
    for r in dedup_by_identity(records) {
        for d in r.attended_dates.iter() {
            match index.get(d) {
                Some(idx) => rosters[*idx].participants.push(r),
                None => debug!(
                    "participants_by_date: {} outside of the campaign for {:?}",
                    d, r.identity
                ),
            }
        }
    }
    rosters
}

/// The days with the most participants. All the tied days are returned, so every day
/// of the campaign comes back with a count of 0 when nobody attended.
pub fn max_attendance_dates(rosters: &[DateRoster]) -> MaxAttendance {
    let count = rosters
        .iter()
        .map(|r| r.participants.len() as u64)
        .max()
        .unwrap_or(0);
    let dates = rosters
        .iter()
        .filter(|r| r.participants.len() as u64 == count)
        .map(|r| r.label.clone())
        .collect();
    MaxAttendance { dates, count }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, gender: &str, affiliation: &str, age: Option<i32>, dates: &[&str]) -> ParticipantRecord {
        ParticipantRecord {
            identity: IdentityKey {
                name: name.to_string(),
                gender: gender.to_string(),
                affiliation: affiliation.to_string(),
                birth_year: age.map(|a| 2025 - a),
            },
            name: name.to_string(),
            age,
            marital_status: None,
            attended_dates: dates.iter().map(|s| s.to_string()).collect(),
            first_date: dates.first().map(|s| s.to_string()).unwrap_or_default(),
        }
    }

    fn counts(buckets: &[AggregateBucket]) -> Vec<(String, u64)> {
        buckets.iter().map(|b| (b.label.clone(), b.count)).collect()
    }

    #[test]
    fn genders_ignore_unknown_labels_and_duplicates() {
        let a = record("a", "형제", "x", None, &["4월 21일"]);
        let records = vec![
            a.clone(),
            a,
            record("b", "자매", "x", None, &["4월 21일"]),
            record("c", "?", "x", None, &["4월 21일"]),
        ];
        assert_eq!(
            counts(&gender_counts(&records)),
            vec![("형제".to_string(), 1), ("자매".to_string(), 1)]
        );
    }

    #[test]
    fn marital_statuses() {
        let mut a = record("a", "형제", "x", None, &["4월 21일"]);
        a.marital_status = Some("기혼".to_string());
        let mut b = record("b", "자매", "x", None, &["4월 21일"]);
        b.marital_status = Some("이혼".to_string());
        let c = record("c", "자매", "x", None, &["4월 21일"]);
        assert_eq!(
            counts(&marital_status_counts(&[a, b, c])),
            vec![("기혼".to_string(), 1), ("미혼".to_string(), 0)]
        );
    }

    #[test]
    fn age_brackets_skip_young_and_unknown() {
        let records: Vec<ParticipantRecord> = [Some(9), Some(10), Some(19), Some(35), Some(69), Some(70), Some(95), None]
            .iter()
            .enumerate()
            .map(|(i, age)| record(&i.to_string(), "형제", "x", *age, &["4월 21일"]))
            .collect();
        let b = age_brackets(&records);
        assert_eq!(
            b.iter().map(|b| b.count).collect::<Vec<u64>>(),
            vec![2, 0, 1, 0, 0, 1, 2]
        );
        assert_eq!(b[6].label, "70대 이상");
    }

    #[test]
    fn histogram_excludes_out_of_range_counts() {
        let many: Vec<String> = (1..=8).map(|d| format!("5월 {}일", d)).collect();
        let many_refs: Vec<&str> = many.iter().map(|s| s.as_str()).collect();
        let records = vec![
            record("a", "형제", "x", None, &["4월 21일"]),
            record("b", "형제", "x", None, &["4월 21일", "4월 22일"]),
            record("c", "형제", "x", None, &many_refs),
        ];
        let h = attendance_histogram(&records, 7);
        assert_eq!(h.len(), 7);
        assert_eq!(h[0], AggregateBucket::new("1일", 1));
        assert_eq!(h[1], AggregateBucket::new("2일", 1));
        assert_eq!(h.iter().map(|b| b.count).sum::<u64>(), 2);
    }

    #[test]
    fn positional_affiliation_ranks() {
        let mut records = Vec::new();
        for (aff, n) in [("A", 5), ("B", 5), ("C", 3)] {
            for i in 0..n {
                records.push(record(&format!("{}{}", aff, i), "형제", aff, None, &["4월 21일"]));
            }
        }
        records.push(record("nobody", "형제", "", None, &["4월 21일"]));
        let ranked = affiliation_ranking(&records, 2);
        assert_eq!(
            ranked,
            vec![
                AggregateBucket { label: "A".to_string(), count: 5, rank: Some(1) },
                AggregateBucket { label: "B".to_string(), count: 5, rank: Some(2) },
            ]
        );
    }

    #[test]
    fn tie_aware_ranks() {
        let buckets = vec![
            AggregateBucket::new("C", 3),
            AggregateBucket::new("A", 5),
            AggregateBucket::new("B", 5),
            AggregateBucket::new("D", 1),
        ];
        let ranks: Vec<(String, Option<u32>)> = shared_ranks(&buckets)
            .into_iter()
            .map(|b| (b.label, b.rank))
            .collect();
        assert_eq!(
            ranks,
            vec![
                ("A".to_string(), Some(1)),
                ("B".to_string(), Some(1)),
                ("C".to_string(), Some(3)),
                ("D".to_string(), Some(4)),
            ]
        );
    }

    #[test]
    fn regions_by_prefix() {
        let regions: Vec<String> = crate::config::DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect();
        let records = vec![
            record("a", "형제", "경기평택지산", None, &["4월 21일"]),
            record("b", "형제", "서울성수", None, &["4월 21일"]),
            record("c", "형제", "서울중앙", None, &["4월 21일"]),
            record("d", "형제", "평택", None, &["4월 21일"]),
        ];
        assert_eq!(
            counts(&region_rollup(&records, &regions)),
            vec![("서울".to_string(), 2), ("경기".to_string(), 1)]
        );
    }

    #[test]
    fn average_ages() {
        assert_eq!(average_age(&[]), "0");
        let records = vec![
            record("a", "형제", "x", Some(30), &["4월 21일"]),
            record("b", "형제", "x", Some(41), &["4월 21일"]),
            record("c", "형제", "x", None, &["4월 21일"]),
        ];
        assert_eq!(average_age(&records), "35.5");
        assert_eq!(average_age(&records[2..]), "0");
    }

    #[test]
    fn rosters_and_busiest_days() {
        let window = CampaignWindow::default();
        let records = vec![
            record("a", "형제", "x", None, &["4월 21일", "4월 22일"]),
            record("b", "자매", "x", None, &["4월 22일", "6월 1일"]),
            record("c", "자매", "x", None, &["4월 21일"]),
        ];
        let rosters = participants_by_date(&records, &window);
        assert_eq!(rosters.len(), 28);
        assert_eq!(rosters[0].participants.len(), 2);
        assert_eq!(rosters[1].participants.len(), 2);
        assert_eq!(rosters[2].participants.len(), 0);
        assert_eq!(
            max_attendance_dates(&rosters),
            MaxAttendance {
                dates: vec!["4월 21일".to_string(), "4월 22일".to_string()],
                count: 2
            }
        );
        let empty = participants_by_date(&[], &window);
        let busiest = max_attendance_dates(&empty);
        assert_eq!(busiest.count, 0);
        assert_eq!(busiest.dates.len(), 28);
        assert_eq!(busiest.dates[0], "4월 21일");
        assert_eq!(busiest.dates[27], "5월 18일");
    }
}
