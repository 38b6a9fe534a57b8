use super::{COLUMN_COUNT, Cell, Column, ColumnKind, FIELD_SEPARATOR, Line, Row};
use crate::config::PipelineConfig;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RowRejection {
    LowConfidence { column: ColumnKind, confidence: f64 },
    MissingSeparator,
}

#[derive(Default)]
struct CellBuilder {
    y: Option<i32>,
    texts: Vec<String>,
    confidence_sum: f64,
    word_count: usize,
}

impl CellBuilder {
    fn finish(self) -> Cell {
        let confidence = if self.word_count == 0 {
            0.0
        } else {
            (self.confidence_sum / self.word_count as f64).clamp(0.0, 100.0)
        };

        Cell {
            y: self.y,
            texts: self.texts,
            confidence,
        }
    }
}

pub(super) fn assemble_row(line: &Line, columns: &[Column], config: &PipelineConfig) -> Row {
    let alignment = config.column_alignment as i32;
    let mut builders: [CellBuilder; COLUMN_COUNT] = std::array::from_fn(|_| CellBuilder::default());
    let mut current = 0;

    for word in &line.words {
        let aligned = columns
            .iter()
            .enumerate()
            .take(COLUMN_COUNT)
            .filter(|(_, column)| (column.x - word.bounds.x).abs() <= alignment)
            .min_by_key(|(_, column)| (column.x - word.bounds.x).abs())
            .map(|(index, _)| index);

        if let Some(index) = aligned {
            current = index;
            let builder = &mut builders[current];
            if builder.y.is_none() {
                builder.y = Some(word.bounds.y);
            }
        }

        let builder = &mut builders[current];
        builder.texts.push(word.text.clone());
        builder.confidence_sum += word.confidence;
        builder.word_count += 1;
    }

    Row {
        cells: builders.map(CellBuilder::finish),
    }
}

/// Rows cut through by a band edge show up as low-confidence fragments or
/// as rows whose date and record number both lost their separators.
pub(super) fn accept_row(row: &Row, config: &PipelineConfig) -> Result<(), RowRejection> {
    for kind in ColumnKind::ALL {
        let cell = row.cell(kind);
        if !cell.is_empty() && cell.confidence < config.row_min_confidence {
            return Err(RowRejection::LowConfidence {
                column: kind,
                confidence: cell.confidence,
            });
        }
    }

    let has_separator = [ColumnKind::ReceivedDate, ColumnKind::RecordNumber]
        .into_iter()
        .any(|kind| row.text(kind).contains(FIELD_SEPARATOR));
    if !has_separator {
        return Err(RowRejection::MissingSeparator);
    }

    Ok(())
}
