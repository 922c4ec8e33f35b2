use clap::ValueEnum;
use jieba_rs::Jieba;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Splits normalized text into candidate word tokens.
pub trait Segmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Dictionary + HMM segmentation for Chinese-heavy text.
pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl JiebaSegmenter {
    pub fn new() -> Self {
        let start = std::time::Instant::now();
        let jieba = Jieba::new();
        debug!(
            "Jieba dictionary loaded - duration={:.2}s",
            start.elapsed().as_secs_f32()
        );
        Self { jieba }
    }
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, true)
    }
}

/// UAX#29 word boundaries; CJK ideographs come out one per token.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeWordSegmenter;

impl Segmenter for UnicodeWordSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_word_bounds().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SegmenterKind {
    #[default]
    Jieba,
    Unicode,
}

impl SegmenterKind {
    pub fn build(self) -> Box<dyn Segmenter> {
        match self {
            SegmenterKind::Jieba => Box::new(JiebaSegmenter::new()),
            SegmenterKind::Unicode => Box::new(UnicodeWordSegmenter),
        }
    }
}

/// Segment `text`, trimming each piece and dropping blank ones.
pub fn tokenize<'a>(segmenter: &dyn Segmenter, text: &'a str) -> Vec<&'a str> {
    segmenter
        .segment(text)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
