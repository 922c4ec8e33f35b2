use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use itertools::Itertools;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::punctuation::PunctuationTally;
use crate::rank::{ranked_words, RankedEntry};

const RULE_WIDE: usize = 50;
const RULE: usize = 40;
const RULE_NARROW: usize = 30;

/// Wall-clock instant captured once per run and shared by every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp(DateTime<Local>);

impl RunStamp {
    pub fn now() -> Self {
        Self(Local::now())
    }

    #[cfg(test)]
    pub fn at(at: DateTime<Local>) -> Self {
        Self(at)
    }

    /// `YYYYMMDD_HHMMSS`, used in file names.
    pub fn file_suffix(&self) -> String {
        self.0.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn human(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Inputs shared by all three text reports.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub ranked: &'a [RankedEntry],
    pub punctuation: &'a PunctuationTally,
    pub min_frequency: u64,
    pub punctuation_stats: bool,
    pub stopword_count: usize,
    pub stamp: RunStamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub detailed: PathBuf,
    pub vocabulary: PathBuf,
    pub summary: PathBuf,
}

impl ReportPaths {
    pub fn for_run(dir: &Path, stamp: &RunStamp) -> Self {
        let ts = stamp.file_suffix();
        Self {
            detailed: dir.join(format!("高频词分析结果_{}.txt", ts)),
            vocabulary: dir.join(format!("高频词汇表_{}.txt", ts)),
            summary: dir.join(format!("分析摘要_{}.txt", ts)),
        }
    }
}

pub fn render_detailed(input: &ReportInput) -> String {
    let mut out = String::new();
    out.push_str(&format!("高频词分析结果 (出现次数 ≥ {})\n", input.min_frequency));
    out.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDE)));

    let qualifying: Vec<_> = input
        .punctuation
        .iter()
        .filter(|(_, count)| *count > 0 && *count >= input.min_frequency)
        .collect();
    if input.punctuation_stats && !qualifying.is_empty() {
        out.push_str("特殊标点统计 (整行都是该标点):\n");
        out.push_str(&format!("{}\n", "-".repeat(RULE)));
        for (category, count) in qualifying {
            out.push_str(&format!("[整行都是{}]: {:>6}\n", category.name(), count));
        }
        out.push('\n');
    }

    out.push_str("高频词汇:\n");
    out.push_str(&format!("{}\n", "-".repeat(RULE)));
    for (word, count) in ranked_words(input.ranked) {
        out.push_str(&format!("{:<15} {:>6}\n", word, count));
    }
    out
}

pub fn render_vocabulary(input: &ReportInput) -> String {
    let mut out = String::new();
    for (word, _) in ranked_words(input.ranked) {
        out.push_str(word);
        out.push('\n');
    }
    out
}

pub fn render_summary(input: &ReportInput) -> String {
    let mut out = String::new();
    out.push_str("聊天记录高频词分析摘要\n");
    out.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDE)));
    out.push_str(&format!("分析时间: {}\n", input.stamp.human()));
    out.push_str(&format!("最小出现次数阈值: {}\n", input.min_frequency));
    out.push_str(&format!(
        "纯标点统计: {}\n",
        if input.punctuation_stats { "开启" } else { "关闭" }
    ));
    out.push_str(&format!("发现的高频词数量: {}\n", input.ranked.len()));
    out.push_str(&format!("使用的排除词数量: {}\n\n", input.stopword_count));

    if input.punctuation_stats {
        out.push_str("特殊标点统计:\n");
        out.push_str(&format!("{}\n", "-".repeat(RULE_NARROW)));
        for (category, count) in input.punctuation.iter() {
            out.push_str(&format!("整行都是{}: {}次\n", category.name(), count));
        }
        out.push('\n');
    }

    out.push_str("词汇长度分布:\n");
    for (len, n) in length_histogram(input.ranked) {
        out.push_str(&format!("  长度{}: {}个\n", len, n));
    }
    out
}

/// Character length → number of ranked words of that length, ascending by length.
pub fn length_histogram(ranked: &[RankedEntry]) -> Vec<(usize, usize)> {
    ranked_words(ranked)
        .map(|(word, _)| word.chars().count())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}

/// Write the detailed report, vocabulary list and summary into `dir`.
pub fn write_reports(dir: &Path, input: &ReportInput) -> Result<ReportPaths> {
    let paths = ReportPaths::for_run(dir, &input.stamp);

    write_atomic(&paths.detailed, &render_detailed(input))?;
    info!("Detailed report written - path={}", paths.detailed.display());

    write_atomic(&paths.vocabulary, &render_vocabulary(input))?;
    info!("Vocabulary list written - path={}", paths.vocabulary.display());

    write_atomic(&paths.summary, &render_summary(input))?;
    info!("Summary written - path={}", paths.summary.display());

    Ok(paths)
}

/// Sibling `.partial` file that is removed unless explicitly committed.
struct PartialFile {
    tmp: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(target: &Path) -> Self {
        let mut name = target.as_os_str().to_owned();
        name.push(".partial");
        Self {
            tmp: PathBuf::from(name),
            committed: false,
        }
    }

    fn commit(mut self, target: &Path) -> Result<()> {
        fs::rename(&self.tmp, target)
            .with_context(|| format!("rename {:?} -> {:?}", self.tmp, target))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed && self.tmp.exists() {
            if let Err(e) = fs::remove_file(&self.tmp) {
                warn!("Could not remove partial file - path={}, error={}", self.tmp.display(), e);
            }
        }
    }
}

/// Write `contents` so that `path` only ever holds a complete file.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let contents = contents.as_ref();
    let partial = PartialFile::new(path);
    {
        let file = File::create(&partial.tmp)
            .with_context(|| format!("create {:?}", partial.tmp))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(contents)
            .with_context(|| format!("write {:?}", partial.tmp))?;
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("flush {:?}", partial.tmp))?;
        file.sync_all()
            .with_context(|| format!("sync {:?}", partial.tmp))?;
    }
    partial.commit(path)?;
    debug!("Wrote {} bytes - path={}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punctuation::PunctuationCategory;
    use crate::rank::Label;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn stamp() -> RunStamp {
        RunStamp::at(Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap())
    }

    fn sample() -> (Vec<RankedEntry>, PunctuationTally) {
        let mut tally = PunctuationTally::default();
        tally.add(PunctuationCategory::Period, 30);
        tally.add(PunctuationCategory::QuestionMark, 2);
        let ranked = vec![
            RankedEntry {
                label: Label::WholeLine(PunctuationCategory::Period),
                count: 30,
            },
            RankedEntry::word("哈哈哈", 25),
            RankedEntry::word("ok", 21),
            RankedEntry::word("你好", 20),
        ];
        (ranked, tally)
    }

    fn input<'a>(ranked: &'a [RankedEntry], tally: &'a PunctuationTally) -> ReportInput<'a> {
        ReportInput {
            ranked,
            punctuation: tally,
            min_frequency: 20,
            punctuation_stats: true,
            stopword_count: 123,
            stamp: stamp(),
        }
    }

    #[test]
    fn stamp_formats() {
        assert_eq!(stamp().file_suffix(), "20240309_070501");
        assert_eq!(stamp().human(), "2024-03-09 07:05:01");
    }

    #[test]
    fn detailed_lists_qualifying_punctuation_then_words() {
        let (ranked, tally) = sample();
        let text = render_detailed(&input(&ranked, &tally));

        let expected = format!(
            "高频词分析结果 (出现次数 ≥ 20)\n{}\n\n特殊标点统计 (整行都是该标点):\n{}\n[整行都是句号]:     30\n\n高频词汇:\n{}\n{:<15} {:>6}\n{:<15} {:>6}\n{:<15} {:>6}\n",
            "=".repeat(50),
            "-".repeat(40),
            "-".repeat(40),
            "哈哈哈", 25,
            "ok", 21,
            "你好", 20,
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn detailed_omits_punctuation_block_when_disabled() {
        let (ranked, tally) = sample();
        let mut inp = input(&ranked, &tally);
        inp.punctuation_stats = false;
        assert!(!render_detailed(&inp).contains("特殊标点统计"));
    }

    #[test]
    fn detailed_skips_absent_punctuation_at_zero_threshold() {
        let tally = PunctuationTally::default();
        let ranked = vec![RankedEntry::word("好", 1)];
        let mut inp = input(&ranked, &tally);
        inp.min_frequency = 0;

        let text = render_detailed(&inp);

        assert!(!text.contains("特殊标点统计"));
        assert!(!text.contains("[整行都是"));
    }

    #[test]
    fn vocabulary_is_words_only() {
        let (ranked, tally) = sample();
        assert_eq!(render_vocabulary(&input(&ranked, &tally)), "哈哈哈\nok\n你好\n");
    }

    #[test]
    fn summary_has_metadata_full_tally_and_histogram() {
        let (ranked, tally) = sample();
        let text = render_summary(&input(&ranked, &tally));

        assert!(text.contains("分析时间: 2024-03-09 07:05:01\n"));
        assert!(text.contains("最小出现次数阈值: 20\n"));
        assert!(text.contains("纯标点统计: 开启\n"));
        assert!(text.contains("发现的高频词数量: 4\n"));
        assert!(text.contains("使用的排除词数量: 123\n"));
        assert!(text.contains("整行都是句号: 30次\n"));
        assert!(text.contains("整行都是问号: 2次\n"));
        assert!(text.ends_with("词汇长度分布:\n  长度2: 2个\n  长度3: 1个\n"));
    }

    #[test]
    fn histogram_counts_characters_not_bytes() {
        let ranked = vec![RankedEntry::word("你好", 5), RankedEntry::word("hi", 5)];
        assert_eq!(length_histogram(&ranked), vec![(2, 2)]);
    }

    #[test]
    fn write_reports_produces_triad_without_partials() {
        let dir = tempfile::tempdir().unwrap();
        let (ranked, tally) = sample();

        let paths = write_reports(dir.path(), &input(&ranked, &tally)).unwrap();

        assert_eq!(paths, ReportPaths::for_run(dir.path(), &stamp()));
        assert!(paths.detailed.ends_with("高频词分析结果_20240309_070501.txt"));
        assert_eq!(fs::read_to_string(&paths.vocabulary).unwrap(), "哈哈哈\nok\n你好\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn failed_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing_dir").join("report.txt");

        assert!(write_atomic(&target, "data").is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
