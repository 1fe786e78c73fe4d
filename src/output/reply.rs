//! User-facing replies and their plain text rendering
//!
//! Replies are rendered in Russian and split into chunks no longer than a chat
//! message limit: first on record boundaries, then on line boundaries, and
//! only then in the middle of a line.

use crate::crawler::{CandidateRecord, SearchReport, SearchStatus};
use crate::output::traits::{OutputResult, ReplySink};
use crate::ScoutError;
use std::io::{self, Write};

/// Chat message size limit in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4096;

/// What the user is told after a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Shown when an interactive session starts and on `/start` or `/help`
    Greeting,

    /// The query was empty; nothing was crawled
    EmptyQuery,

    /// Acknowledgement sent before a search starts
    Searching { query: String },

    /// Matching complexes, in discovery order
    Found {
        query: String,
        records: Vec<CandidateRecord>,
    },

    /// The crawl ended without a match
    NotFound { query: String, status: SearchStatus },

    /// The site root could not be fetched
    Unavailable,
}

impl Reply {
    pub fn from_report(report: &SearchReport) -> Self {
        if report.records.is_empty() {
            Self::NotFound {
                query: report.query.clone(),
                status: report.status,
            }
        } else {
            Self::Found {
                query: report.query.clone(),
                records: report.records.clone(),
            }
        }
    }

    /// Any hard search error is reported as the service being unavailable
    pub fn from_result(result: &Result<SearchReport, ScoutError>) -> Self {
        match result {
            Ok(report) => Self::from_report(report),
            Err(_) => Self::Unavailable,
        }
    }
}

/// Renders a reply into chunks of at most `max_chunk_chars` characters
///
/// # Example
///
/// ```
/// use zhk_scout::output::{render_reply, Reply};
///
/// let chunks = render_reply(&Reply::EmptyQuery, 4096);
/// assert_eq!(chunks, vec!["Введите название ЖК для поиска.".to_string()]);
/// ```
pub fn render_reply(reply: &Reply, max_chunk_chars: usize) -> Vec<String> {
    let limit = max_chunk_chars.max(1);
    let blocks = reply_blocks(reply)
        .into_iter()
        .flat_map(|block| split_block(block, limit));
    pack(blocks, "\n\n", limit)
}

fn reply_blocks(reply: &Reply) -> Vec<String> {
    match reply {
        Reply::Greeting => {
            vec!["Привет! Я бот для поиска информации по жилым комплексам.".to_string()]
        }
        Reply::EmptyQuery => vec!["Введите название ЖК для поиска.".to_string()],
        Reply::Searching { query } => {
            vec![format!("Ищу информацию о {}, пожалуйста, подождите...", query)]
        }
        Reply::Found { query, records } => {
            let mut blocks = Vec::with_capacity(records.len() + 1);
            blocks.push(format!("Информация о {} найдена.", query));
            for (index, record) in records.iter().enumerate() {
                blocks.push(record_block(index + 1, record));
            }
            blocks
        }
        Reply::NotFound { query, status } => {
            let text = match status {
                SearchStatus::CrawlBudgetExhausted => format!(
                    "По запросу «{}» ничего не найдено: достигнут лимит просмотренных страниц. Попробуйте уточнить название.",
                    query
                ),
                SearchStatus::NoMatchFound | SearchStatus::Matched => {
                    format!("По запросу «{}» ничего не найдено.", query)
                }
            };
            vec![text]
        }
        Reply::Unavailable => vec![
            "Сайт временно недоступен. Произошла ошибка при обработке вашего запроса, попробуйте снова позже."
                .to_string(),
        ],
    }
}

fn record_block(number: usize, record: &CandidateRecord) -> String {
    let mut block = format!("{}. {}", number, record.title);
    if let Some(description) = &record.description {
        block.push('\n');
        block.push_str(description);
    }
    block.push('\n');
    block.push_str(record.detail_url.as_str());
    block
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits an oversized block on line boundaries, hard-splitting long lines
fn split_block(block: String, limit: usize) -> Vec<String> {
    if char_len(&block) <= limit {
        return vec![block];
    }
    let lines = block
        .lines()
        .flat_map(|line| hard_split(line, limit))
        .collect::<Vec<_>>();
    pack(lines, "\n", limit)
}

fn hard_split(line: &str, limit: usize) -> Vec<String> {
    if char_len(line) <= limit {
        return vec![line.to_string()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(limit).map(|piece| piece.iter().collect()).collect()
}

/// Greedily joins pieces (each at most `limit` chars) into chunks
fn pack<I>(pieces: I, separator: &str, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let separator_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        if current.is_empty() {
            current = piece;
            current_len = piece_len;
        } else if current_len + separator_len + piece_len <= limit {
            current.push_str(separator);
            current.push_str(&piece);
            current_len += separator_len + piece_len;
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
            current_len = piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Writes rendered replies to a writer, one chunk per paragraph
///
/// Used by the command-line front end with standard output.
pub struct StdoutSink<W: Write = io::Stdout> {
    out: W,
    max_chunk_chars: usize,
}

impl StdoutSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReplySink for StdoutSink<W> {
    fn deliver(&mut self, reply: &Reply) -> OutputResult<()> {
        for chunk in render_reply(reply, self.max_chunk_chars) {
            writeln!(self.out, "{}", chunk)?;
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }
}
