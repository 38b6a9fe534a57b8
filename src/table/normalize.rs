use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::{PipelineConfig, ReferenceVocabulary, VocabularyEntry};

const STATE_CODES: [&str; 8] = ["SA", "NSW", "VIC", "QLD", "WA", "TAS", "NT", "ACT"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NormalizedAddress {
    pub text: String,
    pub street_number: String,
    pub street: Option<String>,
    pub suburb: Option<String>,
}

impl NormalizedAddress {
    fn unrecognized(raw: &str) -> Self {
        Self {
            text: raw.trim().to_string(),
            street_number: String::new(),
            street: None,
            suburb: None,
        }
    }

    pub fn has_numbered_street(&self) -> bool {
        !self.street_number.is_empty() && self.street.is_some()
    }
}

pub(super) fn normalize_address(
    raw: &str,
    vocabulary: &ReferenceVocabulary,
    config: &PipelineConfig,
) -> NormalizedAddress {
    let mut tokens = raw.split_whitespace().collect::<Vec<&str>>();

    let mut region = Vec::<&str>::new();
    while tokens.len() > 1 && region.len() < 2 {
        let Some(&last) = tokens.last() else {
            break;
        };
        if !is_region_token(last) {
            break;
        }
        region.insert(0, last);
        tokens.pop();
    }

    let Some((suburb, suburb_start)) = match_suburb(&tokens, vocabulary, config) else {
        return NormalizedAddress::unrecognized(raw);
    };
    let body = &tokens[..suburb_start];

    let mut parts = Vec::<String>::new();
    let mut street_number = Vec::<&str>::new();
    let mut street = None;

    match match_street(body, vocabulary, config) {
        Some((entry, numbers, consumed)) => {
            street_number = numbers;
            parts.extend(street_number.iter().map(|token| token.to_string()));
            parts.push(entry.canonical.clone());
            parts.extend(body[consumed..].iter().map(|token| token.to_string()));
            street = Some(entry.canonical.clone());
        }
        None => {
            street_number.extend(
                body.iter()
                    .take_while(|token| is_street_number_token(token))
                    .copied(),
            );
            parts.extend(body.iter().map(|token| token.to_string()));
        }
    }

    parts.push(suburb.canonical.clone());
    parts.extend(region.iter().map(|token| token.to_string()));

    NormalizedAddress {
        text: parts.join(" "),
        street_number: street_number.join(" "),
        street,
        suburb: Some(suburb.canonical.clone()),
    }
}

fn match_suburb<'v>(
    tokens: &[&str],
    vocabulary: &'v ReferenceVocabulary,
    config: &PipelineConfig,
) -> Option<(&'v VocabularyEntry, usize)> {
    let window_limit = config.suburb_max_tokens.min(tokens.len());
    for take in 1..=window_limit {
        let start = tokens.len() - take;
        let candidate = tokens[start..].join(" ");
        if let Some(entry) = closest_match(
            &candidate,
            &vocabulary.suburb_names,
            config.suburb_max_distance,
        ) {
            return Some((entry, start));
        }
    }

    None
}

/// Grows a window from the front of the address, leaving street-number
/// tokens out of the text that is compared against known street names.
fn match_street<'v, 'a>(
    body: &[&'a str],
    vocabulary: &'v ReferenceVocabulary,
    config: &PipelineConfig,
) -> Option<(&'v VocabularyEntry, Vec<&'a str>, usize)> {
    for end in 1..=body.len() {
        let window = &body[..end];
        if window
            .last()
            .is_some_and(|token| is_street_number_token(token))
        {
            continue;
        }

        let (numbers, names): (Vec<&str>, Vec<&str>) = window
            .iter()
            .copied()
            .partition(|token| is_street_number_token(token));
        if names.is_empty() {
            continue;
        }

        let candidate = names.join(" ");
        if let Some(entry) = closest_match(
            &candidate,
            &vocabulary.street_names,
            config.street_max_distance,
        ) {
            return Some((entry, numbers, end));
        }
    }

    None
}

pub(super) fn closest_match<'v>(
    candidate: &str,
    entries: &'v [VocabularyEntry],
    max_distance: usize,
) -> Option<&'v VocabularyEntry> {
    let key = candidate.to_uppercase();
    entries
        .iter()
        .map(|entry| (strsim::levenshtein(&key, &entry.key), entry))
        .filter(|(distance, _)| *distance <= max_distance)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, entry)| entry)
}

/// Unit and range forms such as `12`, `7A`, `2/121-130A` are street numbers.
pub(super) fn is_street_number_token(token: &str) -> bool {
    if token.chars().count() < 2 {
        return true;
    }

    token.split(['/', '-']).all(|part| {
        let digits = part.trim_end_matches(|character: char| character.is_ascii_alphabetic());
        let suffix_len = part.len() - digits.len();
        !digits.is_empty()
            && digits.chars().all(|character| character.is_ascii_digit())
            && suffix_len <= 1
    })
}

fn is_region_token(token: &str) -> bool {
    let upper = token.to_uppercase();
    STATE_CODES.contains(&upper.as_str())
        || (token.len() == 4 && token.chars().all(|character| character.is_ascii_digit()))
}

/// Replaces whole letter runs that appear in the misspelling table.
pub(super) fn correct_free_text(raw: &str, misspellings: &HashMap<String, String>) -> String {
    let mut corrected = String::with_capacity(raw.len());
    let mut run = String::new();
    let mut run_is_letters = false;

    for character in raw.chars() {
        let is_letter = character.is_alphabetic();
        if !run.is_empty() && is_letter != run_is_letters {
            push_run(&mut corrected, &run, run_is_letters, misspellings);
            run.clear();
        }
        run_is_letters = is_letter;
        run.push(character);
    }
    push_run(&mut corrected, &run, run_is_letters, misspellings);

    corrected
}

fn push_run(
    output: &mut String,
    run: &str,
    is_letters: bool,
    misspellings: &HashMap<String, String>,
) {
    match misspellings.get(run) {
        Some(replacement) if is_letters => output.push_str(replacement),
        _ => output.push_str(run),
    }
}

pub(super) fn normalize_received_date(raw: &str) -> String {
    let compact = raw.split_whitespace().collect::<String>();
    let year = compact.rsplit('/').next().unwrap_or_default();
    if !year.chars().all(|character| character.is_ascii_digit()) {
        return String::new();
    }
    let format = match year.len() {
        2 => "%d/%m/%y",
        4 => "%d/%m/%Y",
        _ => return String::new(),
    };

    NaiveDate::parse_from_str(&compact, format)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
