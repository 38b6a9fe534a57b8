use std::cmp::Ordering;
use std::collections::HashMap;

use super::{COLUMN_COUNT, Cell, ColumnKind, FIELD_SEPARATOR, Row};
use crate::config::PipelineConfig;

const EXPECTED_SEPARATORS: usize = 2;

/// Collapses rows seen in several overlapping bands into one row per record.
/// Rows are first merged by vertical position, then by record-number text.
pub(super) fn deduplicate_rows(rows: Vec<Row>, config: &PipelineConfig) -> Vec<Row> {
    let positioned = group_by_position(rows, config.line_alignment as i32)
        .into_iter()
        .filter_map(merge_rows)
        .collect::<Vec<Row>>();

    group_by_record_number(positioned)
        .into_iter()
        .filter_map(merge_rows)
        .collect()
}

pub(super) fn group_by_position(rows: Vec<Row>, line_alignment: i32) -> Vec<Vec<Row>> {
    let (mut placed, unplaced): (Vec<Row>, Vec<Row>) =
        rows.into_iter().partition(|row| row.y().is_some());
    placed.sort_by_key(|row| row.y().unwrap_or_default());

    let mut buckets = Vec::<Vec<Row>>::new();
    let mut anchor: Option<i32> = None;
    for row in placed {
        let y = row.y().unwrap_or_default();
        let joins_anchor = anchor.is_some_and(|anchor_y| y - anchor_y <= line_alignment);
        if joins_anchor && let Some(bucket) = buckets.last_mut() {
            bucket.push(row);
            continue;
        }

        anchor = Some(y);
        buckets.push(vec![row]);
    }

    buckets.extend(unplaced.into_iter().map(|row| vec![row]));
    buckets
}

pub(super) fn group_by_record_number(rows: Vec<Row>) -> Vec<Vec<Row>> {
    let mut buckets = Vec::<Vec<Row>>::new();
    let mut index_by_key = HashMap::<String, usize>::new();

    for row in rows {
        let key = row.text(ColumnKind::RecordNumber).trim().to_string();
        if key.is_empty() {
            buckets.push(vec![row]);
            continue;
        }

        match index_by_key.get(&key) {
            Some(&index) => buckets[index].push(row),
            None => {
                index_by_key.insert(key, buckets.len());
                buckets.push(vec![row]);
            }
        }
    }

    buckets
}

/// Picks the best candidate cell per column. Date and record-number cells
/// prefer the expected `nn/nnn/yyyy` shape over raw OCR confidence.
pub(super) fn merge_rows(bucket: Vec<Row>) -> Option<Row> {
    let mut candidates = bucket.into_iter();
    let mut merged = candidates.next()?;
    let mut earliest_y = merged.y();

    for row in candidates {
        earliest_y = match (earliest_y, row.y()) {
            (Some(left), Some(right)) => Some(left.min(right)),
            (left, right) => left.or(right),
        };

        for (index, candidate) in row.cells.into_iter().enumerate().take(COLUMN_COUNT) {
            let kind = ColumnKind::ALL[index];
            if compare_cells(kind, &candidate, &merged.cells[index]) == Ordering::Greater {
                merged.cells[index] = candidate;
            }
        }
    }

    if merged.cells[0].y.is_none() {
        merged.cells[0].y = earliest_y;
    }

    Some(merged)
}

fn compare_cells(kind: ColumnKind, candidate: &Cell, incumbent: &Cell) -> Ordering {
    if kind.is_structured() {
        let candidate_shape = shape_distance(&candidate.text(kind));
        let incumbent_shape = shape_distance(&incumbent.text(kind));
        let by_shape = incumbent_shape.cmp(&candidate_shape);
        if by_shape != Ordering::Equal {
            return by_shape;
        }
    }

    candidate
        .confidence
        .partial_cmp(&incumbent.confidence)
        .unwrap_or(Ordering::Equal)
}

/// Distance of a value from the `digits/digits/digits` shape: how far the
/// separator count is from two, plus one if any segment holds a non-digit.
pub(super) fn shape_distance(value: &str) -> usize {
    let value = value.trim();
    let separators = value.matches(FIELD_SEPARATOR).count();
    let has_foreign = value
        .chars()
        .any(|character| character != FIELD_SEPARATOR && !character.is_ascii_digit());

    separators.abs_diff(EXPECTED_SEPARATORS) + usize::from(has_foreign)
}
