use std::fmt;

const CATEGORY_COUNT: usize = 2;

/// Whole-line punctuation messages that get counted instead of tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PunctuationCategory {
    Period,
    QuestionMark,
}

impl PunctuationCategory {
    pub const ALL: [PunctuationCategory; CATEGORY_COUNT] =
        [PunctuationCategory::Period, PunctuationCategory::QuestionMark];

    pub fn symbol(self) -> char {
        match self {
            PunctuationCategory::Period => '。',
            PunctuationCategory::QuestionMark => '？',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PunctuationCategory::Period => "句号",
            PunctuationCategory::QuestionMark => "问号",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PunctuationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category count of lines consisting solely of that category's symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PunctuationTally {
    counts: [u64; CATEGORY_COUNT],
}

impl PunctuationTally {
    pub fn get(&self, category: PunctuationCategory) -> u64 {
        self.counts[category.index()]
    }

    pub fn add(&mut self, category: PunctuationCategory, n: u64) {
        self.counts[category.index()] += n;
    }

    /// All categories in fixed order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (PunctuationCategory, u64)> + '_ {
        PunctuationCategory::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Tally `line` if it is made only of one category symbol.
    ///
    /// Returns the matched category; a matched line must not be tokenized.
    pub fn observe(&mut self, line: &str, enabled: bool) -> Option<PunctuationCategory> {
        let category = classify_line(line, enabled)?;
        self.add(category, 1);
        Some(category)
    }
}

/// Classify a raw line as a whole-line punctuation message.
pub fn classify_line(line: &str, enabled: bool) -> Option<PunctuationCategory> {
    if !enabled {
        return None;
    }
    let stripped = line.trim();
    let first = stripped.chars().next()?;
    let category = PunctuationCategory::ALL
        .into_iter()
        .find(|c| c.symbol() == first)?;
    stripped
        .chars()
        .all(|ch| ch == first)
        .then_some(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_period_line_is_counted_once() {
        let mut tally = PunctuationTally::default();
        assert_eq!(tally.observe("。", true), Some(PunctuationCategory::Period));
        assert_eq!(tally.get(PunctuationCategory::Period), 1);
        assert_eq!(tally.get(PunctuationCategory::QuestionMark), 0);
    }

    #[test]
    fn repeated_symbols_count_as_one_line() {
        let mut tally = PunctuationTally::default();
        assert!(tally.observe("。。。", true).is_some());
        assert!(tally.observe("  ？？ \r\n", true).is_some());
        assert_eq!(tally.get(PunctuationCategory::Period), 1);
        assert_eq!(tally.get(PunctuationCategory::QuestionMark), 1);
    }

    #[test]
    fn mixed_or_other_lines_are_not_consumed() {
        for line in ["。？", "好。", "", "   ", "...", "?", "。 。"] {
            assert_eq!(classify_line(line, true), None, "line {:?}", line);
        }
    }

    #[test]
    fn disabled_flag_never_consumes() {
        let mut tally = PunctuationTally::default();
        assert_eq!(tally.observe("。", false), None);
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn iter_lists_every_category_in_order() {
        let mut tally = PunctuationTally::default();
        tally.add(PunctuationCategory::QuestionMark, 4);
        let all: Vec<_> = tally.iter().collect();
        assert_eq!(
            all,
            vec![
                (PunctuationCategory::Period, 0),
                (PunctuationCategory::QuestionMark, 4)
            ]
        );
    }
}
