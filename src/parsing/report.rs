//! Tip Distribution Report parsing.
//!
//! The printed report is a table with the columns home store, partner name,
//! partner number and total tippable hours. OCR engines flatten it in one of
//! two ways: one table row per line (typical of local OCR), or one cell per
//! line (typical of cloud layout analysis). Both are handled here.

use std::collections::HashSet;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::PartnerHours;

/// Largest number of lines between a name cell and its hours cell.
const MAX_STITCH_DISTANCE: usize = 3;

/// Upper bound on plausible tippable hours for one partner in one period.
const MAX_PARTNER_HOURS: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// How far a reported total may differ from the parsed sum and still match.
const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

static FULL_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\d{4,6}\s+)?(?P<name>[A-Za-z][A-Za-z'.,\- ]*?[A-Za-z.])\s+(?:[Uu][Ss])?(?:\d{4,10}\s+)?(?P<hours>\d{1,3}(?:[.,]\d{1,2})?)$",
    )
    .expect("full row pattern is valid")
});

static NAME_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z'.,\- ]*[A-Za-z.]$").expect("name pattern is valid"));

static HOURS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(?:[.,]\d{1,2})?$").expect("hours pattern is valid"));

static IDENTIFIER_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[Uu][Ss])?\d{4,10}$").expect("identifier pattern is valid"));

static TOTAL_WITH_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^totals?\b[^0-9]*(?P<total>\d{1,4}(?:[.,]\d{1,2})?)$")
        .expect("total pattern is valid")
});

static TOTAL_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^totals?\b[^0-9]*$").expect("total label pattern is valid"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").expect("date pattern is valid"));

/// Whole words that only occur in report headings, never in partner names.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:partner name|partner number|tippable|home store|store number|tip distribution|report|executed by|time period|page|disclaimer|hours)\b",
    )
    .expect("header pattern is valid")
});

/// Words that make a candidate name implausible.
const NON_NAME_WORDS: [&str; 7] = ["total", "store", "partner", "hours", "page", "report", "number"];

/// The structured result of parsing report text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    /// Partners in the order they appear in the report.
    pub partners: Vec<PartnerHours>,
    /// How much the parse can be trusted, 0-100.
    pub confidence: u8,
    /// The total tippable hours printed on the report, if found.
    pub reported_total: Option<Decimal>,
    /// Whether the table heading was recognized.
    pub header_found: bool,
}

impl ParsedReport {
    /// Sum of the parsed partner hours.
    pub fn total_hours(&self) -> Decimal {
        self.partners.iter().map(|p| p.hours).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSource {
    SingleLine,
    Stitched,
}

#[derive(Default)]
struct ReportScanner {
    partners: Vec<PartnerHours>,
    sources: Vec<RowSource>,
    seen: HashSet<String>,
    pending_name: Option<(String, usize)>,
    expect_total: bool,
    reported_total: Option<Decimal>,
    header_found: bool,
}

impl ReportScanner {
    fn scan_line(&mut self, line: &str) {
        if let Some(caps) = TOTAL_WITH_VALUE_RE.captures(line) {
            self.reported_total = parse_hours(&caps["total"]);
            self.pending_name = None;
            self.expect_total = false;
            return;
        }

        if TOTAL_LABEL_RE.is_match(line) {
            if line.to_ascii_lowercase().contains("tippable") {
                self.header_found = true;
            }
            self.pending_name = None;
            self.expect_total = true;
            return;
        }

        if is_header(line) {
            let lower = line.to_ascii_lowercase();
            if lower.contains("partner name") || lower.contains("tippable") {
                self.header_found = true;
            }
            self.age_pending();
            return;
        }

        if let Some(caps) = FULL_ROW_RE.captures(line) {
            let name = clean_name(&caps["name"]);
            if is_plausible_name(&name) {
                if let Some(hours) = parse_hours(&caps["hours"]).filter(|h| is_plausible_hours(*h)) {
                    self.push(name, hours, RowSource::SingleLine);
                }
                self.pending_name = None;
                self.expect_total = false;
                return;
            }
        }

        if HOURS_ONLY_RE.is_match(line) {
            if let Some((name, _)) = self.pending_name.take() {
                if let Some(hours) = parse_hours(line).filter(|h| is_plausible_hours(*h)) {
                    self.push(name, hours, RowSource::Stitched);
                }
            } else if self.expect_total {
                self.reported_total = parse_hours(line);
                self.expect_total = false;
            }
            return;
        }

        if IDENTIFIER_ONLY_RE.is_match(line) {
            self.age_pending();
            return;
        }

        if NAME_ONLY_RE.is_match(line) {
            let name = clean_name(line);
            if is_plausible_name(&name) {
                self.pending_name = Some((name, 0));
                self.expect_total = false;
                return;
            }
        }

        self.age_pending();
    }

    fn age_pending(&mut self) {
        if let Some((_, distance)) = self.pending_name.as_mut() {
            *distance += 1;
            if *distance > MAX_STITCH_DISTANCE {
                self.pending_name = None;
            }
        }
    }

    fn push(&mut self, name: String, hours: Decimal, source: RowSource) {
        if !self.seen.insert(name.to_lowercase()) {
            return;
        }
        self.partners.push(PartnerHours::new(name, hours));
        self.sources.push(source);
    }

    fn finish(self) -> ParsedReport {
        let confidence = score(
            &self.partners,
            &self.sources,
            self.reported_total,
            self.header_found,
        );
        ParsedReport {
            partners: self.partners,
            confidence,
            reported_total: self.reported_total,
            header_found: self.header_found,
        }
    }
}

/// Extracts partner names and hours from OCR text of a Tip Distribution Report.
///
/// Header lines, report titles, dates and partner numbers are skipped. A
/// line starting with "Total" is read as the report's printed total rather
/// than as a partner. Hours outside `(0, 100]` are rejected, and repeated
/// names (ignoring case) keep their first occurrence.
///
/// # Examples
///
/// ```
/// use tip_steward::parsing::parse_hours_report;
///
/// let text = "\
/// Home Store | Partner Name | Partner Number | Total Tippable Hours
/// 69600 | Johnson, Avery | US1234567 | 32.50
/// 69600 | Rivera, Blake | US2345678 | 18.25
/// Total Tippable Hours: 50.75";
///
/// let report = parse_hours_report(text);
/// assert_eq!(report.partners.len(), 2);
/// assert_eq!(report.partners[0].name, "Johnson, Avery");
/// assert_eq!(report.confidence, 100);
/// ```
pub fn parse_hours_report(text: &str) -> ParsedReport {
    let mut scanner = ReportScanner::default();
    for line in text.lines().map(normalize_line).filter(|l| !l.is_empty()) {
        scanner.scan_line(&line);
    }
    scanner.finish()
}

fn normalize_line(line: &str) -> String {
    line.replace(['|', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_header(line: &str) -> bool {
    DATE_RE.is_match(line) || HEADER_RE.is_match(line)
}

fn clean_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_plausible_name(name: &str) -> bool {
    let letters = name.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if letters < 2 {
        return false;
    }
    let lower = name.to_ascii_lowercase();
    !lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .any(|word| NON_NAME_WORDS.contains(&word))
}

fn parse_hours(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

fn is_plausible_hours(hours: Decimal) -> bool {
    hours > Decimal::ZERO && hours <= MAX_PARTNER_HOURS
}

fn score(
    partners: &[PartnerHours],
    sources: &[RowSource],
    reported_total: Option<Decimal>,
    header_found: bool,
) -> u8 {
    if partners.is_empty() {
        return 0;
    }

    let mut score: i32 = 50;
    if header_found {
        score += 15;
    }

    if let Some(total) = reported_total {
        let parsed: Decimal = partners.iter().map(|p| p.hours).sum();
        if (total - parsed).abs() <= TOTAL_TOLERANCE {
            score += 25;
        } else {
            score -= 20;
        }
    }

    let single_line = sources
        .iter()
        .filter(|s| **s == RowSource::SingleLine)
        .count();
    score += ((single_line * 10 + partners.len() / 2) / partners.len()) as i32;

    score.clamp(0, 100) as u8
}
