use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::SplitWhitespace;

use match_core::{CandidateMatch, PairKey, PairwiseMatchTable};

use crate::error::MatchFileError;

/// Default name of the putative matches file inside the match directory
pub const PUTATIVE_MATCHES_FILE: &str = "matches.putative.txt";

/// Write pairs in `(i, j)` order as:
///
/// ```text
/// i j
/// <count>
/// <left> <right>   (count lines)
/// ```
pub fn write_matches<W: Write>(table: &PairwiseMatchTable, out: W) -> std::io::Result<()> {
    let mut out = BufWriter::new(out);
    for (pair, matches) in table.iter() {
        writeln!(out, "{} {}", pair.left, pair.right)?;
        writeln!(out, "{}", matches.len())?;
        for m in matches {
            writeln!(out, "{} {}", m.left, m.right)?;
        }
    }
    out.flush()
}

pub fn save_matches(table: &PairwiseMatchTable, path: &Path) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_matches(table, file)
}

fn parse_token(token: &str, what: &str) -> Result<usize, MatchFileError> {
    token
        .parse()
        .map_err(|_| MatchFileError::Malformed(format!("bad {} {:?}", what, token)))
}

fn take(tokens: &mut SplitWhitespace<'_>, what: &str) -> Result<usize, MatchFileError> {
    match tokens.next() {
        Some(token) => parse_token(token, what),
        None => Err(MatchFileError::Malformed(format!("unexpected end of file, expected {}", what))),
    }
}

/// Parse the format produced by [`write_matches`]. Distances are not stored.
pub fn parse_matches(text: &str) -> Result<PairwiseMatchTable, MatchFileError> {
    let mut tokens = text.split_whitespace();
    let mut table = PairwiseMatchTable::new();

    while let Some(token) = tokens.next() {
        let left = parse_token(token, "left image id")?;
        let right = take(&mut tokens, "right image id")?;
        if left >= right {
            return Err(MatchFileError::Malformed(format!("pair ({}, {}) is not ordered", left, right)));
        }
        let count = take(&mut tokens, "match count")?;
        let mut matches = Vec::with_capacity(count);
        for _ in 0..count {
            let l = take(&mut tokens, "left feature index")?;
            let r = take(&mut tokens, "right feature index")?;
            matches.push(CandidateMatch::without_distance(l, r));
        }
        if table.insert(PairKey::new(left, right), matches).is_some() {
            return Err(MatchFileError::Malformed(format!("pair ({}, {}) listed twice", left, right)));
        }
    }
    Ok(table)
}

pub fn load_matches(path: &Path) -> Result<PairwiseMatchTable, MatchFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_matches(&text)
}
