//! Groups a flat snapshot into per-(lottery, schedule) tables.
//!
//! Display order: lotteries ascending, schedules descending within a lottery
//! (latest draw slot on top), records newest first inside each table.
//! Groups are rebuilt from scratch for every snapshot.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{ResultRecord, Schedule};

/// Records sharing one `(lottery, schedule)` key, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup<'a> {
    #[serde(rename = "loteria")]
    pub lottery: &'a str,
    #[serde(rename = "horario")]
    pub schedule: &'a Schedule,
    #[serde(rename = "resultados")]
    pub records: Vec<&'a ResultRecord>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    lottery: &'a str,
    schedule: &'a Schedule,
}

/// Partition `records` into ordered groups. Empty input gives no groups.
pub fn group(records: &[ResultRecord]) -> Vec<ResultGroup<'_>> {
    let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<ResultGroup<'_>> = Vec::new();

    for record in records {
        let key = GroupKey {
            lottery: &record.lottery,
            schedule: &record.schedule,
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ResultGroup {
                lottery: &record.lottery,
                schedule: &record.schedule,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    for g in &mut groups {
        g.records.sort_by(|a, b| cmp_newest_first(a, b));
    }

    groups.sort_by(|a, b| {
        locale_cmp(a.lottery, b.lottery).then_with(|| cmp_schedule_desc(a.schedule, b.schedule))
    });
    groups
}

/// Same as [`group`] but only for tables of one lottery.
pub fn group_for_lottery<'a>(records: &'a [ResultRecord], lottery: &str) -> Vec<ResultGroup<'a>> {
    let mut groups = group(records);
    groups.retain(|g| g.lottery == lottery);
    groups
}

/// Distinct lottery names, ascending.
pub fn lotteries(records: &[ResultRecord]) -> Vec<&str> {
    let mut names: Vec<&str> = records.iter().map(|r| r.lottery.as_str()).collect();
    names.sort_by(|a, b| locale_cmp(a, b));
    names.dedup();
    names
}

fn sort_instant(record: &ResultRecord) -> Option<DateTime<Utc>> {
    record.timestamp().and_then(|t| t.parse())
}

fn cmp_newest_first(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    // None < Some, so reversing puts missing/unparseable timestamps last
    let raw = |r: &ResultRecord| r.timestamp().map(|t| t.as_str().to_owned());
    // serde_json::Map is key-sorted, so its text form is canonical
    let extra = |r: &ResultRecord| serde_json::to_string(&r.extra).ok();
    sort_instant(b)
        .cmp(&sort_instant(a))
        .then_with(|| raw(b).cmp(&raw(a)))
        .then_with(|| a.number.as_str().cmp(b.number.as_str()))
        .then_with(|| a.animal.cmp(&b.animal))
        .then_with(|| extra(a).cmp(&extra(b)))
}

fn cmp_schedule_desc(a: &Schedule, b: &Schedule) -> Ordering {
    match (a, b) {
        (Schedule::Slot(x), Schedule::Slot(y)) => locale_cmp(y, x),
        (Schedule::Slot(_), Schedule::Unscheduled) => Ordering::Less,
        (Schedule::Unscheduled, Schedule::Slot(_)) => Ordering::Greater,
        (Schedule::Unscheduled, Schedule::Unscheduled) => Ordering::Equal,
    }
}

/// Case- and accent-insensitive comparison, falling back to codepoint order
/// so distinct strings never compare equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let fa = a.chars().flat_map(char::to_lowercase).map(fold_accent);
    let fb = b.chars().flat_map(char::to_lowercase).map(fold_accent);
    fa.cmp(fb).then_with(|| a.cmp(b))
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
