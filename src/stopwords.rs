use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StopwordError {
    #[error("I/O error accessing stopword file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/* ------------------------------ Stop words -------------------------------- */

static BUILTIN_STOPWORDS: &[&str] = &[
    // common single characters
    "的", "了", "和", "是", "就", "都", "而", "及", "与", "或",
    "在", "中", "我", "你", "他", "她", "它", "们",
    "这", "那", "哪", "谁", "什么", "怎么", "为什么",
    "啊", "哦", "嗯", "哈", "啦", "呀", "吧", "吗", "呢",
    "不", "没", "有", "也", "又", "再",
    "上", "下", "左", "右", "前", "后", "里", "外",
    "一", "二", "三", "四", "五", "六", "七", "八", "九", "十",
    "很", "最", "太", "更", "非常", "特别",
    // latin letters
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    // digits
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    // punctuation and whitespace
    ".", ",", "。", "，", "!", "！", "?", "？", ":", "：", ";", "；",
    "(", ")", "（", "）", "[", "]", "{", "}", "<", ">",
    "\"", "'", "「", "」", "『", "』", "、",
    " ", "\t", "\n", "\r",
    // filler words and phrases
    "这个", "那个", "一个", "一些", "一种", "一样",
    "时候", "时间", "开始", "然后", "最后",
    "可以", "可能", "可是", "但是", "虽然", "如果",
    "因为", "所以", "而且", "那么",
    "这样", "那样",
    "有点", "有些",
    "自己", "别人", "大家", "有人",
    "知道", "觉得", "认为", "以为",
    "看到", "听见", "听到", "想到",
    "今天", "明天", "昨天", "现在", "以前", "以后",
    "还有", "还是",
    "这里", "那里", "哪里", "这边", "那边",
    "的话", "的说", "的是", "了了",
];

const TEMPLATE: &str = "# Stopword list
# One word per line. Chinese, English, digits and symbols are all accepted.
# Lines starting with # are ignored.

# common single characters
的
了
在
是
我
你
他
们
这
那

# latin letters
a
b
c
d
e

# digits
0
1
2
3

# punctuation
.
,
!

# add any other words you want excluded below...
";

/// Tokens excluded from ranking regardless of frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl Default for StopwordSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StopwordSet {
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in set merged with `path` when it exists and is readable.
    pub fn load(path: &Path) -> Self {
        let mut set = Self::builtin();
        if !path.exists() {
            info!("Using built-in stopwords - count={}", set.len());
            return set;
        }

        match read_stopword_file(path) {
            Ok(user) => {
                info!(
                    "Loaded user stopwords - path={}, count={}",
                    path.display(),
                    user.len()
                );
                set.words.extend(user);
            }
            Err(e) => warn!("Stopword file unreadable, using built-in set - {}", e),
        }
        info!("Stopword set ready - count={}", set.len());
        set
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

pub fn read_stopword_file(path: &Path) -> Result<HashSet<String>, StopwordError> {
    let text = fs::read_to_string(path).map_err(|source| StopwordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_stopwords(&text))
}

fn parse_stopwords(text: &str) -> HashSet<String> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// `--create-exclude`: write the template list unless the file already exists.
pub fn create_exclude_list(path: &Path) -> Result<PathBuf, StopwordError> {
    if path.exists() {
        info!("Stopword file already exists - path={}", path.display());
        return Ok(path.to_path_buf());
    }
    fs::write(path, TEMPLATE).map_err(|source| StopwordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Stopword template created - path={}", path.display());
    Ok(path.to_path_buf())
}
