use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::analysis::analyze_file;
use crate::cloud::{generate_wordcloud, CloudOutcome, SvgCloudRenderer};
use crate::config::load_settings;
use crate::punctuation::PunctuationTally;
use crate::rank::{rank, RankParams, RankedEntry};
use crate::report::{write_reports, ReportInput, ReportPaths, RunStamp};
use crate::segment::SegmenterKind;
use crate::stopwords::StopwordSet;

const PREVIEW_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub config: PathBuf,
    pub stopwords: PathBuf,
    pub output_dir: PathBuf,
    pub segmenter: SegmenterKind,
}

/// How far a run got; every variant is a clean finish.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    InputUnavailable,
    NothingCounted,
    NothingRanked,
    Completed {
        reports: ReportPaths,
        cloud: CloudOutcome,
    },
}

pub fn run(opts: &RunOptions) -> Result<RunOutcome> {
    let pipeline_start = std::time::Instant::now();
    info!("Pipeline started - input={}", opts.input.display());

    // 1) settings + stopwords, once
    let settings = load_settings(&opts.config);
    let stopwords = StopwordSet::load(&opts.stopwords);
    info!(
        "Run parameters - min_frequency={}, punctuation_stats={}, stopwords={}, segmenter={:?}",
        settings.min_frequency,
        settings.enable_punctuation_stats,
        stopwords.len(),
        opts.segmenter
    );

    // 2) single pass over the log
    let segmenter = opts.segmenter.build();
    let stats = match analyze_file(&opts.input, segmenter.as_ref(), settings.enable_punctuation_stats) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Analysis aborted - {}", e);
            return Ok(RunOutcome::InputUnavailable);
        }
    };
    if stats.words.is_empty() {
        warn!("No words counted - input is empty or contains no text");
        return Ok(RunOutcome::NothingCounted);
    }
    if settings.enable_punctuation_stats {
        print!("{}", render_punctuation_counts(&stats.punctuation));
    }

    // 3) filter + rank
    let params = RankParams {
        min_frequency: settings.min_frequency,
        punctuation_stats: settings.enable_punctuation_stats,
    };
    let ranked = rank(&stats.words, &stats.punctuation, &stopwords, params);
    info!(
        "Ranking completed - candidates={}, ranked={}",
        stats.words.len(),
        ranked.len()
    );
    if ranked.is_empty() {
        warn!(
            "Nothing reached min_frequency={} outside the stopword list; lower the threshold or edit the stopwords",
            settings.min_frequency
        );
        return Ok(RunOutcome::NothingRanked);
    }
    print!("{}", render_preview(&ranked, settings.min_frequency));

    // 4) reports
    let stamp = RunStamp::now();
    let input = ReportInput {
        ranked: &ranked,
        punctuation: &stats.punctuation,
        min_frequency: settings.min_frequency,
        punctuation_stats: settings.enable_punctuation_stats,
        stopword_count: stopwords.len(),
        stamp,
    };
    let reports = write_reports(&opts.output_dir, &input)?;

    // 5) word cloud, failures stay local
    let cloud = generate_wordcloud(
        &ranked,
        &settings,
        &SvgCloudRenderer::default(),
        &opts.output_dir,
        &stamp,
    );
    debug!("Word cloud outcome: {:?}", cloud);

    print!("{}", render_artifacts(&reports, &cloud));
    info!(
        "Pipeline completed - total_duration={:.2}s, ranked={}",
        pipeline_start.elapsed().as_secs_f32(),
        ranked.len()
    );
    Ok(RunOutcome::Completed { reports, cloud })
}

fn render_punctuation_counts(tally: &PunctuationTally) -> String {
    let mut out = String::new();
    out.push_str("\n特殊标点统计 (整行都是该标点):\n");
    out.push_str(&format!("{}\n", "-".repeat(40)));
    for (category, count) in tally.iter().filter(|(_, c)| *c > 0) {
        out.push_str(&format!("整行都是{}: {}次\n", category.name(), count));
    }
    out
}

/// Console preview: every pseudo-label, then the top words.
pub fn render_preview(ranked: &[RankedEntry], min_frequency: u64) -> String {
    let (pseudo, words): (Vec<&RankedEntry>, Vec<&RankedEntry>) =
        ranked.iter().partition(|e| e.label.is_pseudo());

    let mut out = String::new();
    out.push_str(&format!(
        "\n前{}个高频项 (出现次数 ≥ {}):\n",
        PREVIEW_LIMIT, min_frequency
    ));
    out.push_str(&format!("{}\n", "-".repeat(40)));

    if !pseudo.is_empty() {
        out.push_str("特殊标点:\n");
        for (i, e) in pseudo.iter().enumerate() {
            out.push_str(&format!("{:2}. {:<20} {:>6}\n", i + 1, e.label.to_string(), e.count));
        }
        out.push('\n');
    }

    out.push_str("高频词汇:\n");
    for (i, e) in words.iter().take(PREVIEW_LIMIT).enumerate() {
        out.push_str(&format!("{:2}. {:<15} {:>6}\n", i + 1, e.label.to_string(), e.count));
    }
    out
}

fn render_artifacts(reports: &ReportPaths, cloud: &CloudOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "=".repeat(50)));
    out.push_str("分析完成！生成的文件:\n");
    out.push_str(&format!("1. 详细分析结果: {}\n", reports.detailed.display()));
    out.push_str(&format!("2. 高频词汇表: {}\n", reports.vocabulary.display()));
    out.push_str(&format!("3. 分析摘要: {}\n", reports.summary.display()));
    if let Some(p) = cloud.path() {
        out.push_str(&format!("4. 词云图片: {}\n", p.display()));
    }
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out
}
