//! Frequency statistics over a whole snapshot.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::models::ResultRecord;

pub const TOP_ANIMALS: usize = 10;

/// `(name, count)` pairs, highest count first. Equal counts keep the order in
/// which the name first appeared in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCounts(pub Vec<(String, usize)>);

// Serialized as a JSON object whose key order is the ranking.
impl Serialize for RankedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSummary {
    pub total: usize,
    #[serde(rename = "por_loteria")]
    pub per_lottery: RankedCounts,
    #[serde(rename = "animais_mais_frequentes")]
    pub top_animals: RankedCounts,
}

pub fn summarize(records: &[ResultRecord]) -> StatsSummary {
    let per_lottery = rank(records.iter().map(|r| r.lottery.as_str()), usize::MAX);
    let top_animals = rank(records.iter().map(|r| r.animal.as_str()), TOP_ANIMALS);
    StatsSummary {
        total: records.len(),
        per_lottery,
        top_animals,
    }
}

fn rank<'a>(names: impl Iterator<Item = &'a str>, limit: usize) -> RankedCounts {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for name in names {
        match seen.get(name) {
            Some(&i) => tally[i].1 += 1,
            None => {
                seen.insert(name, tally.len());
                tally.push((name, 1));
            }
        }
    }
    // stable: ties stay in first-seen order
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.truncate(limit);
    RankedCounts(tally.into_iter().map(|(n, c)| (n.to_string(), c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::models::{DrawNumber, Schedule};
    use proptest::prelude::*;
    use serde_json::{json, Map};

    fn rec(lottery: &str, animal: &str) -> ResultRecord {
        ResultRecord {
            lottery: lottery.to_string(),
            schedule: Schedule::Unscheduled,
            number: DrawNumber("00".into()),
            animal: animal.to_string(),
            timestamp: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn empty_snapshot() {
        let s = summarize(&[]);
        assert_eq!(s.total, 0);
        assert!(s.per_lottery.0.is_empty());
        assert!(s.top_animals.0.is_empty());
    }

    #[test]
    fn scenario_counts() {
        let records = vec![rec("PT", "Burro"), rec("PT", "Veado"), rec("RJ", "Burro")];
        let s = summarize(&records);
        assert_eq!(s.total, 3);
        assert_eq!(s.per_lottery.0, vec![("PT".to_string(), 2), ("RJ".to_string(), 1)]);
        assert_eq!(s.top_animals.0, vec![("Burro".to_string(), 2), ("Veado".to_string(), 1)]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = vec![
            rec("Federal", "Gato"),
            rec("Bahia", "Leão"),
            rec("Federal", "Leão"),
            rec("Bahia", "Gato"),
            rec("Aval", "Cobra"),
        ];
        let s = summarize(&records);
        let lotteries: Vec<&str> = s.per_lottery.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(lotteries, vec!["Federal", "Bahia", "Aval"]);
        let animals: Vec<&str> = s.top_animals.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(animals, vec!["Gato", "Leão", "Cobra"]);
    }

    #[test]
    fn top_animals_capped_at_ten() {
        let animals = [
            "Avestruz", "Águia", "Burro", "Borboleta", "Cachorro", "Cabra", "Carneiro", "Camelo",
            "Cobra", "Coelho", "Cavalo", "Elefante",
        ];
        let mut records: Vec<ResultRecord> = animals.iter().map(|a| rec("Federal", a)).collect();
        records.push(rec("Federal", "Elefante"));
        let s = summarize(&records);
        assert_eq!(s.top_animals.0.len(), TOP_ANIMALS);
        assert_eq!(s.top_animals.0[0], ("Elefante".to_string(), 2));
        assert!(s.top_animals.0.iter().all(|(n, _)| n != "Cavalo"));
    }

    #[test]
    fn serialized_maps_follow_ranking_order() {
        // ranking order disagrees with alphabetical order on both maps
        let records = vec![rec("PT", "Burro"), rec("RJ", "Veado"), rec("RJ", "Veado")];
        let out = serde_json::to_string(&summarize(&records)).unwrap();
        assert_eq!(
            out,
            r#"{"total":3,"por_loteria":{"RJ":2,"PT":1},"animais_mais_frequentes":{"Veado":2,"Burro":1}}"#
        );
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["por_loteria"], json!({"PT": 1, "RJ": 2}));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_counts_are_consistent(
            pairs in prop::collection::vec(("[A-D]", "[a-n]"), 0..60)
        ) {
            let records: Vec<ResultRecord> = pairs.iter().map(|(l, a)| rec(l, a)).collect();
            let s = summarize(&records);

            prop_assert_eq!(s.per_lottery.0.iter().map(|(_, c)| c).sum::<usize>(), s.total);
            let distinct: std::collections::HashSet<&str> =
                records.iter().map(|r| r.animal.as_str()).collect();
            prop_assert_eq!(s.top_animals.0.len(), distinct.len().min(TOP_ANIMALS));
            prop_assert!(s.top_animals.0.windows(2).all(|w| w[0].1 >= w[1].1));
            prop_assert!(s.per_lottery.0.windows(2).all(|w| w[0].1 >= w[1].1));
            prop_assert_eq!(summarize(&records), s);
        }
    }
}
