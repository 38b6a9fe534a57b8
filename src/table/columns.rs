use tracing::debug;

use super::{COLUMN_COUNT, Column, Line};
use crate::config::PipelineConfig;

/// Searches gap thresholds from `column_gap` down to 1 and returns the first
/// clustering that yields exactly `COLUMN_COUNT` recurring column starts.
pub(super) fn locate_columns(lines: &[Line], config: &PipelineConfig) -> Option<Vec<Column>> {
    for gap in (1..=config.column_gap as i32).rev() {
        let columns = cluster_column_starts(lines, gap, config.column_alignment as i32);
        if columns.len() == COLUMN_COUNT {
            debug!(gap, "column search converged");
            return Some(columns);
        }
    }

    None
}

pub(super) fn cluster_column_starts(lines: &[Line], gap: i32, alignment: i32) -> Vec<Column> {
    let mut clusters = Vec::<Column>::new();

    for line in lines {
        let mut previous_right: Option<i32> = None;
        for word in &line.words {
            let is_start = match previous_right {
                Some(right) => word.bounds.x - right >= gap,
                None => true,
            };
            previous_right = Some(word.bounds.right());

            if !is_start {
                continue;
            }

            let nearest = clusters
                .iter_mut()
                .filter(|cluster| (cluster.x - word.bounds.x).abs() <= alignment)
                .min_by_key(|cluster| (cluster.x - word.bounds.x).abs());
            match nearest {
                Some(cluster) => cluster.count += 1,
                None => clusters.push(Column {
                    x: word.bounds.x,
                    count: 1,
                }),
            }
        }
    }

    let total = clusters.iter().map(|cluster| cluster.count).sum::<usize>();
    let minimum = (total as f64 / COLUMN_COUNT as f64) / 2.0;
    clusters.retain(|cluster| cluster.count as f64 >= minimum);
    clusters.sort_by_key(|cluster| cluster.x);
    clusters
}
