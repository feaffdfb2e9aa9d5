//! Decoder for the raw positional-field noun data format.
//!
//! Each non-header line describes one synset:
//!
//! ```text
//! offset lex_filenum ss_type w_cnt word lex_id [word lex_id...] p_cnt [ptr...] | gloss
//! ```
//!
//! `w_cnt` and `lex_id` are hexadecimal, `p_cnt` is decimal and every pointer
//! is a `(symbol, offset, pos, source/target)` 4-tuple. Only whole-synset noun
//! pointers (`pos == "n"`, `source/target == "0000"`) are kept; the rest are
//! word-level or cross-part-of-speech links outside the noun model.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use crate::models::{Synset, SynsetBuilder, SynsetId};
use crate::symbols::{self, SymbolLookup};

/// Marker that opens the license header lines at the top of a data file.
const HEADER_PREFIX: &str = "  ";

/// Source/target field value for pointers between whole synsets.
const WHOLE_SYNSET: &str = "0000";

/// A malformed data line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {reason}")]
pub struct ParseError {
    /// 1-based physical line number in the input.
    pub line_number: usize,
    pub reason: ParseErrorReason,
}

/// Why a data line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorReason {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("declared {declared} {field} but only {found} are present")]
    Truncated {
        field: &'static str,
        declared: usize,
        found: usize,
    },

    #[error("{0} unexpected tokens before the gloss separator")]
    TrailingTokens(usize),

    #[error("unsupported part of speech '{0}'")]
    UnsupportedPartOfSpeech(String),
}

/// Returns true for license header lines, which are skipped before decoding.
pub fn is_header(line: &str) -> bool {
    line.starts_with(HEADER_PREFIX)
}

/// Decodes a single data line into a synset.
///
/// # Errors
///
/// Returns `ParseError` carrying `line_number` when a positional field is
/// missing, a number does not parse, or a declared count does not match the
/// tokens present.
///
/// # Examples
///
/// ```
/// use hyres::decoder::decode_line;
///
/// let line = "00001740 03 n 01 entity 0 001 ~ 00001930 n 0000 | that which exists";
/// let synset = decode_line(line, 1).unwrap();
/// assert_eq!(synset.id.as_str(), "00001740-n");
/// assert_eq!(synset.hyponyms.len(), 1);
/// assert_eq!(synset.gloss, "that which exists");
/// ```
pub fn decode_line(line: &str, line_number: usize) -> Result<Synset, ParseError> {
    decode_fields(line).map_err(|reason| ParseError {
        line_number,
        reason,
    })
}

/// Decodes a whole data file.
///
/// Header and blank lines are skipped. Lines are decoded in parallel; the
/// synsets come back in input order. Decoding is fail-fast: the error for the
/// lowest failing line number is returned and no synsets are produced.
///
/// # Errors
///
/// Returns the first `ParseError` by line number.
pub fn decode_all(input: &str) -> Result<Vec<Synset>, ParseError> {
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_header(line) && !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
        .collect();

    let decoded: Vec<Result<Synset, ParseError>> = lines
        .par_iter()
        .map(|(line_number, line)| decode_line(line, *line_number))
        .collect();

    let synsets = decoded.into_iter().collect::<Result<Vec<_>, _>>()?;
    debug!(synsets = synsets.len(), "decoded data lines");
    Ok(synsets)
}

fn decode_fields(line: &str) -> Result<Synset, ParseErrorReason> {
    let (Some(first_bar), Some(last_bar)) = (line.find('|'), line.rfind('|')) else {
        return Err(ParseErrorReason::MissingField("gloss"));
    };
    let gloss = line[last_bar + 1..].trim();
    let mut tokens = line[..first_bar].split_whitespace();

    let offset = tokens
        .next()
        .ok_or(ParseErrorReason::MissingField("synset offset"))?;
    check_offset(offset, "synset offset")?;
    tokens
        .next()
        .ok_or(ParseErrorReason::MissingField("lexicographer file number"))?;
    let pos = tokens
        .next()
        .ok_or(ParseErrorReason::MissingField("part of speech"))?;
    if pos != "n" {
        return Err(ParseErrorReason::UnsupportedPartOfSpeech(pos.to_string()));
    }

    let mut builder = SynsetBuilder::new(SynsetId::from_offset(offset)).gloss(gloss);

    let word_count = parse_number(tokens.next(), "word count", 16)?;
    for found in 0..word_count {
        let (Some(word), Some(lex_id)) = (tokens.next(), tokens.next()) else {
            return Err(ParseErrorReason::Truncated {
                field: "words",
                declared: word_count,
                found,
            });
        };
        let lex_id = u32::from_str_radix(lex_id, 16).map_err(|_| ParseErrorReason::InvalidNumber {
            field: "lex id",
            value: lex_id.to_string(),
        })?;
        builder = builder.word(word.replace('_', " "), lex_id);
    }

    let mut synset = builder.build();

    let pointer_count = parse_number(tokens.next(), "pointer count", 10)?;
    for found in 0..pointer_count {
        let (Some(symbol), Some(target), Some(target_pos), Some(source_target)) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ParseErrorReason::Truncated {
                field: "pointers",
                declared: pointer_count,
                found,
            });
        };
        check_offset(target, "pointer offset")?;

        if target_pos != "n" || source_target != WHOLE_SYNSET {
            continue;
        }
        match symbols::lookup(symbol) {
            SymbolLookup::Relation(kind) => {
                synset.push_relation(kind, SynsetId::from_offset(target));
            }
            SymbolLookup::Unrecognized => {
                trace!(synset = %synset.id, symbol, "dropping unrecognized pointer symbol");
            }
        }
    }

    let trailing = tokens.count();
    if trailing > 0 {
        return Err(ParseErrorReason::TrailingTokens(trailing));
    }

    Ok(synset)
}

fn parse_number(
    token: Option<&str>,
    field: &'static str,
    radix: u32,
) -> Result<usize, ParseErrorReason> {
    let token = token.ok_or(ParseErrorReason::MissingField(field))?;
    usize::from_str_radix(token, radix).map_err(|_| ParseErrorReason::InvalidNumber {
        field,
        value: token.to_string(),
    })
}

fn check_offset(token: &str, field: &'static str) -> Result<(), ParseErrorReason> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseErrorReason::InvalidNumber {
            field,
            value: token.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HypernymType, PartType, Relation, RelationKind, Word};
    use crate::symbols::symbol_for;

    const MOUSE: &str = "00001740 06 n 02 mouse 0 computer_mouse 1 003 @ 00002000 n 0000 #p 00003000 n 0000 & 00004000 n 0000 | a hand-operated electronic device  ";

    #[test]
    fn decodes_words_relations_and_gloss() {
        let synset = decode_line(MOUSE, 1).expect("line should decode");

        assert_eq!(synset.id, SynsetId::new("00001740-n"));
        assert_eq!(
            synset.words,
            vec![Word::new("mouse", 0), Word::new("computer mouse", 1)]
        );
        assert_eq!(
            synset.hypernyms,
            vec![Relation::new(SynsetId::new("00002000-n"), HypernymType::Regular)]
        );
        assert_eq!(
            synset.holonyms,
            vec![Relation::new(SynsetId::new("00003000-n"), PartType::Part)]
        );
        assert_eq!(synset.relation_count(), 2, "unknown '&' pointer is dropped");
        assert_eq!(synset.gloss, "a hand-operated electronic device");
    }

    #[test]
    fn word_count_and_lex_id_are_hexadecimal() {
        let words: Vec<String> = (0..17).map(|i| format!("w{i} a")).collect();
        let line = format!("00000100 03 n 11 {} 000 | many words", words.join(" "));
        let synset = decode_line(&line, 1).unwrap();

        assert_eq!(synset.words.len(), 17);
        assert!(synset.words.iter().all(|w| w.lex_id == 10));
    }

    #[test]
    fn pointer_count_is_decimal() {
        let pointers: Vec<String> = (0..10)
            .map(|i| format!("~ 0000{i:04} n 0000"))
            .collect();
        let line = format!("00000100 03 n 01 thing 0 010 {} | g", pointers.join(" "));
        let synset = decode_line(&line, 1).unwrap();
        assert_eq!(synset.hyponyms.len(), 10);
    }

    #[test]
    fn word_level_and_non_noun_pointers_are_dropped() {
        let line = "00000100 03 n 01 run 0 003 + 01926311 v 0101 @ 00002000 n 0102 = 01234567 a 0000 | g";
        let synset = decode_line(line, 1).unwrap();
        assert_eq!(synset.relation_count(), 0);
    }

    #[test]
    fn every_known_symbol_lands_in_its_list() {
        let kinds = [
            RelationKind::HYPERNYM,
            RelationKind::Hyponym(HypernymType::Instance),
            RelationKind::Holonym(PartType::Member),
            RelationKind::Meronym(PartType::Substance),
            RelationKind::Domain(crate::models::DomainType::Usage),
            RelationKind::DomainMember(crate::models::DomainType::Topic),
            RelationKind::ANTONYM,
            RelationKind::ATTRIBUTE,
        ];
        let pointers: Vec<String> = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| format!("{} 0000900{i} n 0000", symbol_for(*kind)))
            .collect();
        let line = format!(
            "00000100 03 n 01 x 0 {:03} {} | g",
            kinds.len(),
            pointers.join(" ")
        );

        let synset = decode_line(&line, 1).unwrap();
        let decoded: Vec<RelationKind> = synset.relations().into_iter().map(|(k, _)| k).collect();
        assert_eq!(decoded, kinds);
    }

    #[test]
    fn gloss_is_text_after_last_bar() {
        let line = "00000100 03 n 01 pipe 0 000 | a tube | used for smoking ";
        let synset = decode_line(line, 1).unwrap();
        assert_eq!(synset.gloss, "used for smoking");
    }

    #[test]
    fn missing_gloss_separator_fails() {
        let err = decode_line("00000100 03 n 01 x 0 000", 7).unwrap_err();
        assert_eq!(err.line_number, 7);
        assert_eq!(err.reason, ParseErrorReason::MissingField("gloss"));
    }

    #[test]
    fn truncated_words_fail_with_count_mismatch() {
        let err = decode_line("00000100 03 n 03 a 0 b 0 | g", 3).unwrap_err();
        assert_eq!(
            err.reason,
            ParseErrorReason::Truncated {
                field: "words",
                declared: 3,
                found: 2
            }
        );
    }

    #[test]
    fn truncated_pointers_fail_with_count_mismatch() {
        let err = decode_line("00000100 03 n 01 a 0 002 @ 00002000 n 0000 @ 0000 | g", 1)
            .unwrap_err();
        assert_eq!(
            err.reason,
            ParseErrorReason::Truncated {
                field: "pointers",
                declared: 2,
                found: 1
            }
        );
    }

    #[test]
    fn extra_tokens_fail_with_count_mismatch() {
        let err = decode_line("00000100 03 n 01 a 0 000 stray | g", 1).unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::TrailingTokens(1));
    }

    #[test]
    fn missing_and_invalid_fields() {
        assert_eq!(
            decode_line("| g", 1).unwrap_err().reason,
            ParseErrorReason::MissingField("synset offset")
        );
        assert_eq!(
            decode_line("00000100 03 n | g", 1).unwrap_err().reason,
            ParseErrorReason::MissingField("word count")
        );
        assert!(matches!(
            decode_line("00000100 03 n zz | g", 1).unwrap_err().reason,
            ParseErrorReason::InvalidNumber { field: "word count", .. }
        ));
        assert!(matches!(
            decode_line("0000x100 03 n 01 a 0 000 | g", 1).unwrap_err().reason,
            ParseErrorReason::InvalidNumber { field: "synset offset", .. }
        ));
    }

    #[test]
    fn non_noun_lines_are_rejected() {
        let err = decode_line("00000100 29 v 01 run 0 000 | g", 1).unwrap_err();
        assert_eq!(
            err.reason,
            ParseErrorReason::UnsupportedPartOfSpeech("v".to_string())
        );
    }

    #[test]
    fn decode_all_skips_headers_and_blank_lines() {
        let input = format!(
            "  1 This software and database is being provided\n  2 header\n{MOUSE}\n\n00002000 03 n 01 device 0 000 | an instrumentality\n"
        );
        let synsets = decode_all(&input).unwrap();
        let ids: Vec<&str> = synsets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["00001740-n", "00002000-n"]);
    }

    #[test]
    fn decode_all_reports_first_bad_line_by_number() {
        let input = "00000100 03 n 01 a 0 000 | ok\nbroken\n00000300 03 n 01 c 0 000\n";
        let err = decode_all(input).unwrap_err();
        assert_eq!(err.line_number, 2);
        assert_eq!(err.to_string(), "line 2: missing gloss field");
    }
}
