use std::fmt;

use crate::frequency::FrequencyTable;
use crate::punctuation::{PunctuationCategory, PunctuationTally};
use crate::stopwords::StopwordSet;

/// A ranked report entry: a real token or a whole-line punctuation pseudo-label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Word(String),
    WholeLine(PunctuationCategory),
}

impl Label {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Label::Word(w) => Some(w),
            Label::WholeLine(_) => None,
        }
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, Label::WholeLine(_))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Word(w) => f.write_str(w),
            Label::WholeLine(c) => write!(f, "[整行都是{}]", c.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub label: Label,
    pub count: u64,
}

impl RankedEntry {
    pub fn word(word: impl Into<String>, count: u64) -> Self {
        Self {
            label: Label::Word(word.into()),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankParams {
    pub min_frequency: u64,
    pub punctuation_stats: bool,
}

/// Filter by stopwords and threshold, merge qualifying pseudo-labels, and sort
/// by count descending. Equal counts keep table order, words before pseudo-labels.
pub fn rank(
    words: &FrequencyTable,
    punctuation: &PunctuationTally,
    stopwords: &StopwordSet,
    params: RankParams,
) -> Vec<RankedEntry> {
    // 1) words that survive stopword + threshold filtering
    let mut ranked: Vec<RankedEntry> = words
        .iter()
        .filter(|(token, count)| *count >= params.min_frequency && !stopwords.contains(token))
        .map(|(token, count)| RankedEntry::word(token, count))
        .collect();

    // 2) pseudo-labels bypass the stopword set
    if params.punctuation_stats {
        ranked.extend(
            punctuation
                .iter()
                .filter(|(_, count)| *count > 0 && *count >= params.min_frequency)
                .map(|(category, count)| RankedEntry {
                    label: Label::WholeLine(category),
                    count,
                }),
        );
    }

    // 3) stable sort
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Word entries only, in rank order.
pub fn ranked_words(ranked: &[RankedEntry]) -> impl Iterator<Item = (&str, u64)> + '_ {
    ranked
        .iter()
        .filter_map(|e| e.label.as_word().map(|w| (w, e.count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn params(min_frequency: u64) -> RankParams {
        RankParams {
            min_frequency,
            punctuation_stats: true,
        }
    }

    fn table(pairs: &[(&str, u64)]) -> FrequencyTable {
        pairs.iter().copied().collect()
    }

    #[test]
    fn threshold_drops_below_minimum() {
        let words = table(&[("你好", 25), ("再见", 19)]);
        let ranked = rank(
            &words,
            &PunctuationTally::default(),
            &StopwordSet::builtin(),
            params(20),
        );
        assert_eq!(ranked, vec![RankedEntry::word("你好", 25)]);
    }

    #[test]
    fn stopwords_never_rank() {
        let words = table(&[("的", 1000), ("朋友", 3)]);
        for min in [0, 1, 3, 1000] {
            let ranked = rank(
                &words,
                &PunctuationTally::default(),
                &StopwordSet::builtin(),
                params(min),
            );
            assert!(ranked.iter().all(|e| e.label != Label::Word("的".into())));
        }
    }

    #[test]
    fn pseudo_labels_merge_and_bypass_stopwords() {
        let words = table(&[("哈哈", 30), ("好", 10)]);
        let mut tally = PunctuationTally::default();
        tally.add(PunctuationCategory::Period, 40);
        tally.add(PunctuationCategory::QuestionMark, 5);

        let ranked = rank(&words, &tally, &StopwordSet::builtin(), params(10));

        assert_eq!(
            ranked,
            vec![
                RankedEntry {
                    label: Label::WholeLine(PunctuationCategory::Period),
                    count: 40
                },
                RankedEntry::word("哈哈", 30),
                RankedEntry::word("好", 10),
            ]
        );
        assert_eq!(ranked[0].label.to_string(), "[整行都是句号]");
    }

    #[test]
    fn disabled_categories_are_not_merged() {
        let mut tally = PunctuationTally::default();
        tally.add(PunctuationCategory::Period, 100);
        let ranked = rank(
            &FrequencyTable::new(),
            &tally,
            &StopwordSet::builtin(),
            RankParams {
                min_frequency: 1,
                punctuation_stats: false,
            },
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let words = table(&[("乙", 5), ("甲", 9), ("丙", 5), ("丁", 5)]);
        let ranked = rank(
            &words,
            &PunctuationTally::default(),
            &StopwordSet::default(),
            params(0),
        );
        let labels: Vec<String> = ranked.iter().map(|e| e.label.to_string()).collect();
        assert_eq!(labels, vec!["甲", "乙", "丙", "丁"]);
    }

    #[test]
    fn empty_input_ranks_empty() {
        let ranked = rank(
            &FrequencyTable::new(),
            &PunctuationTally::default(),
            &StopwordSet::builtin(),
            params(0),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn zero_threshold_skips_absent_punctuation() {
        let mut tally = PunctuationTally::default();
        tally.add(PunctuationCategory::Period, 2);
        let ranked = rank(
            &table(&[("好", 1)]),
            &tally,
            &StopwordSet::default(),
            params(0),
        );
        let labels: Vec<String> = ranked.iter().map(|e| e.label.to_string()).collect();
        assert_eq!(labels, vec!["[整行都是句号]", "好"]);
    }

    #[test]
    fn ranked_words_skips_pseudo_labels() {
        let ranked = vec![
            RankedEntry {
                label: Label::WholeLine(PunctuationCategory::QuestionMark),
                count: 9,
            },
            RankedEntry::word("好", 3),
        ];
        assert_eq!(ranked_words(&ranked).collect::<Vec<_>>(), vec![("好", 3)]);
    }

    fn arb_table() -> impl Strategy<Value = Vec<(String, u64)>> {
        prop::collection::vec(("[a-e的了你好]{1,2}", 0u64..50), 0..40)
    }

    proptest! {
        #[test]
        fn every_entry_meets_threshold_and_skips_stopwords(
            pairs in arb_table(),
            period in 0u64..50,
            question in 0u64..50,
            min in 0u64..50,
        ) {
            let words: FrequencyTable = pairs.into_iter().collect();
            let mut tally = PunctuationTally::default();
            tally.add(PunctuationCategory::Period, period);
            tally.add(PunctuationCategory::QuestionMark, question);
            let stop = StopwordSet::builtin();

            let ranked = rank(&words, &tally, &stop, params(min));

            for e in &ranked {
                prop_assert!(e.count >= min);
                if let Some(w) = e.label.as_word() {
                    prop_assert!(!stop.contains(w));
                }
            }
            prop_assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
        }

        #[test]
        fn ranking_is_deterministic(pairs in arb_table(), min in 0u64..10) {
            let words: FrequencyTable = pairs.into_iter().collect();
            let tally = PunctuationTally::default();
            let stop = StopwordSet::builtin();
            let first = rank(&words, &tally, &stop, params(min));
            let second = rank(&words, &tally, &stop, params(min));
            prop_assert_eq!(first, second);
        }
    }
}
