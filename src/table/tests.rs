use std::collections::HashMap;

use anyhow::Result;
use image::{Rgba, RgbaImage};

use super::*;
use crate::ocr::{OcrBox, OcrLine, OcrWord};

const WORD_HEIGHT: i32 = 12;

fn vocabulary() -> ReferenceVocabulary {
    ReferenceVocabulary::new(
        &["Main North Road", "Prospect Road", "Churchill Road"],
        &["MEDINDIE GARDENS", "MEDINDIE", "PROSPECT", "KILBURN"],
        HashMap::from([
            ("Dweling".to_string(), "Dwelling".to_string()),
            ("verandan".to_string(), "verandah".to_string()),
        ]),
    )
}

fn context() -> RecordContext {
    RecordContext {
        source_url: "https://council.example/registers/2018-11.pdf".to_string(),
        comment_address: "mailto:planning@council.example".to_string(),
        scrape_date: "2018-11-20".to_string(),
    }
}

fn word(text: &str, x: i32, y: i32, width: i32, confidence: f64) -> Word {
    Word {
        text: text.to_string(),
        confidence,
        choice_count: 1,
        bounds: Bounds {
            x,
            y,
            width,
            height: WORD_HEIGHT,
        },
    }
}

fn table_line(y: i32, date: &str, number: &str, number_confidence: f64) -> Line {
    Line {
        words: vec![
            word(date, 30, y, 90, 90.0),
            word(number, 150, y, 100, number_confidence),
            word("Dweling", 300, y, 70, 88.0),
            word("addition", 376, y, 70, 88.0),
            word("J", 520, y, 10, 85.0),
            word("Smith", 536, y, 50, 85.0),
            word("2/121-130A", 680, y, 80, 90.0),
            word("Main", 766, y, 40, 90.0),
            word("North", 812, y, 45, 90.0),
            word("Raod", 863, y, 30, 90.0),
            word("MEDINDIE", 899, y, 70, 90.0),
            word("GARDENS", 975, y, 60, 90.0),
            word("SA", 1041, y, 20, 90.0),
            word("5083", 1067, y, 35, 90.0),
        ],
    }
}

fn table_columns() -> Vec<Column> {
    [30, 150, 300, 520, 680]
        .into_iter()
        .map(|x| Column { x, count: 2 })
        .collect()
}

fn row_with_number(number: &str, confidence: f64) -> Row {
    let mut row = Row::default();
    row.cells[0] = Cell {
        y: Some(20),
        texts: vec!["05/11/2018".to_string()],
        confidence: 90.0,
    };
    row.cells[1] = Cell {
        y: Some(20),
        texts: vec![number.to_string()],
        confidence,
    };
    row
}

fn assert_columns_well_formed(columns: &[Column]) {
    assert_eq!(columns.len(), COLUMN_COUNT);
    for pair in columns.windows(2) {
        assert!(pair[0].x < pair[1].x, "columns must be strictly ascending");
    }
}

#[test]
fn locate_columns_discards_rare_clusters() {
    let config = PipelineConfig::default();
    let mut lines = (0..4)
        .map(|index| table_line(20 + index * 30, "05/11/2018", "077/586/2018", 90.0))
        .collect::<Vec<Line>>();
    lines.push(Line {
        words: vec![word("stray", 1200, 200, 40, 40.0)],
    });

    let columns = locate_columns(&lines, &config).expect("five columns should be found");
    assert_columns_well_formed(&columns);
    assert_eq!(
        columns.iter().map(|column| column.x).collect::<Vec<i32>>(),
        vec![30, 150, 300, 520, 680]
    );
    assert!(columns.iter().all(|column| column.count == 4));
}

#[test]
fn locate_columns_shrinks_gap_threshold_for_tight_tables() {
    let config = PipelineConfig::default();
    let lines = (0..3)
        .map(|index| Line {
            words: (0..5)
                .map(|column| word("cell", column * 58, index * 20, 50, 90.0))
                .collect(),
        })
        .collect::<Vec<Line>>();

    assert_eq!(
        cluster_column_starts(
            &lines,
            config.column_gap as i32,
            config.column_alignment as i32
        )
        .len(),
        1
    );

    let columns = locate_columns(&lines, &config).expect("narrow gaps should still resolve");
    assert_columns_well_formed(&columns);
    assert_eq!(columns[4].x, 232);
}

#[test]
fn locate_columns_fails_when_column_count_never_matches() {
    let config = PipelineConfig::default();
    let lines = (0..3)
        .map(|index| Line {
            words: vec![
                word("a", 0, index * 20, 50, 90.0),
                word("b", 150, index * 20, 50, 90.0),
                word("c", 300, index * 20, 50, 90.0),
            ],
        })
        .collect::<Vec<Line>>();

    assert!(locate_columns(&lines, &config).is_none());
    assert!(locate_columns(&[], &config).is_none());
}

#[test]
fn locate_columns_never_returns_wrong_count() {
    let config = PipelineConfig::default();
    let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move |bound: u64| {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (seed >> 33) % bound
    };

    for _ in 0..40 {
        let line_count = 1 + next(6) as i32;
        let lines = (0..line_count)
            .map(|index| {
                let mut x = next(40) as i32;
                let word_count = 1 + next(9);
                let words = (0..word_count)
                    .map(|_| {
                        let width = 10 + next(60) as i32;
                        let placed = word("w", x, index * 20, width, 80.0);
                        x += width + 1 + next(45) as i32;
                        placed
                    })
                    .collect();
                Line { words }
            })
            .collect::<Vec<Line>>();

        if let Some(columns) = locate_columns(&lines, &config) {
            assert_columns_well_formed(&columns);
        }
    }
}

#[test]
fn assemble_row_routes_words_and_joins_by_column_kind() {
    let config = PipelineConfig::default();
    let line = Line {
        words: vec![
            word("05/11/2018", 30, 44, 90, 80.0),
            word("077/586", 150, 45, 60, 70.0),
            word("/2018", 212, 45, 40, 90.0),
            word("Dweling", 300, 44, 70, 88.0),
            word("addition", 376, 44, 70, 92.0),
        ],
    };

    let row = assemble_row(&line, &table_columns(), &config);

    assert_eq!(row.cells.len(), COLUMN_COUNT);
    assert_eq!(row.text(ColumnKind::RecordNumber), "077/586/2018");
    assert_eq!(row.text(ColumnKind::Description), "Dweling addition");
    assert_eq!(row.cell(ColumnKind::RecordNumber).y, Some(45));
    assert_eq!(row.cell(ColumnKind::RecordNumber).confidence, 80.0);
    assert_eq!(row.cell(ColumnKind::Description).confidence, 90.0);
    assert_eq!(row.y(), Some(44));

    let applicant = row.cell(ColumnKind::Applicant);
    assert!(applicant.is_empty());
    assert_eq!(applicant.confidence, 0.0);
    assert!(applicant.y.is_none());

    for cell in &row.cells {
        assert!((0.0..=100.0).contains(&cell.confidence));
    }
}

#[test]
fn assemble_row_keeps_leading_unaligned_words_in_first_column() {
    let config = PipelineConfig::default();
    let line = Line {
        words: vec![
            word("11/2018", 60, 20, 50, 75.0),
            word("077/586/2018", 150, 20, 100, 75.0),
        ],
    };

    let row = assemble_row(&line, &table_columns(), &config);
    assert_eq!(row.text(ColumnKind::ReceivedDate), "11/2018");
    assert!(row.y().is_none());
    assert_eq!(row.cell(ColumnKind::RecordNumber).y, Some(20));
}

#[test]
fn accept_row_applies_confidence_and_separator_gates() {
    let config = PipelineConfig::default();
    let columns = table_columns();

    let good = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 90.0),
        &columns,
        &config,
    );
    assert_eq!(accept_row(&good, &config), Ok(()));

    let partial = assemble_row(
        &Line {
            words: vec![
                word("05/11/2018", 30, 20, 90, 90.0),
                word("077/586/2018", 150, 20, 100, 90.0),
            ],
        },
        &columns,
        &config,
    );
    assert_eq!(accept_row(&partial, &config), Ok(()));

    let weak = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 55.0),
        &columns,
        &config,
    );
    assert_eq!(
        accept_row(&weak, &config),
        Err(RowRejection::LowConfidence {
            column: ColumnKind::RecordNumber,
            confidence: 55.0,
        })
    );

    let bisected = assemble_row(
        &table_line(20, "05112018", "0775862018", 90.0),
        &columns,
        &config,
    );
    assert_eq!(
        accept_row(&bisected, &config),
        Err(RowRejection::MissingSeparator)
    );
}

#[test]
fn shape_distance_scores_separator_count_and_foreign_characters() {
    assert_eq!(shape_distance("077/586/2018"), 0);
    assert_eq!(shape_distance("06O/331/2018"), 1);
    assert_eq!(shape_distance("077/586l2018"), 2);
    assert_eq!(shape_distance("077/586/20/18"), 1);
    assert_eq!(shape_distance(""), 2);
}

#[test]
fn merge_prefers_expected_shape_over_higher_confidence() {
    let merged = merge_rows(vec![
        row_with_number("06O/331/2018", 92.0),
        row_with_number("060/331/2018", 80.0),
    ])
    .expect("bucket is not empty");
    assert_eq!(merged.text(ColumnKind::RecordNumber), "060/331/2018");
    assert_eq!(merged.cell(ColumnKind::RecordNumber).confidence, 80.0);

    let merged = merge_rows(vec![
        row_with_number("077/586l2018", 91.0),
        row_with_number("077/586/2018", 70.0),
    ])
    .expect("bucket is not empty");
    assert_eq!(merged.text(ColumnKind::RecordNumber), "077/586/2018");
}

#[test]
fn merge_uses_confidence_for_free_text_columns() {
    let mut weaker = row_with_number("077/586/2018", 90.0);
    weaker.cells[2] = Cell {
        y: Some(20),
        texts: vec!["Dwelling".to_string(), "additon".to_string()],
        confidence: 71.0,
    };
    let mut stronger = row_with_number("077/586/2018", 90.0);
    stronger.cells[2] = Cell {
        y: Some(21),
        texts: vec!["Dwelling".to_string(), "addition".to_string()],
        confidence: 93.0,
    };

    let merged = merge_rows(vec![weaker, stronger]).expect("bucket is not empty");
    assert_eq!(merged.text(ColumnKind::Description), "Dwelling addition");
}

#[test]
fn merge_of_single_row_bucket_is_identity() {
    let row = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 90.0),
        &table_columns(),
        &PipelineConfig::default(),
    );
    assert_eq!(merge_rows(vec![row.clone()]), Some(row.clone()));

    let once = merge_rows(vec![row.clone(), row.clone()]).expect("bucket is not empty");
    let twice = merge_rows(vec![once.clone()]).expect("bucket is not empty");
    assert_eq!(once, twice);
    assert!(merge_rows(Vec::new()).is_none());
}

#[test]
fn group_by_position_buckets_nearby_rows_and_isolates_unplaced_rows() {
    let config = PipelineConfig::default();
    let columns = table_columns();
    let at = |y: i32| {
        assemble_row(
            &table_line(y, "05/11/2018", "077/586/2018", 90.0),
            &columns,
            &config,
        )
    };
    let unplaced = assemble_row(
        &Line {
            words: vec![word("12/2018", 60, 90, 50, 80.0)],
        },
        &columns,
        &config,
    );

    let buckets = group_by_position(vec![at(40), unplaced, at(23), at(20)], 5);
    let shape = buckets
        .iter()
        .map(|bucket| bucket.iter().map(Row::y).collect::<Vec<Option<i32>>>())
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        vec![vec![Some(20), Some(23)], vec![Some(40)], vec![None]]
    );
}

#[test]
fn deduplicate_rows_merges_same_record_number_across_positions() {
    let config = PipelineConfig::default();
    let columns = table_columns();
    let rows = vec![
        assemble_row(
            &table_line(20, "05/11/2018", "077/586/2018", 90.0),
            &columns,
            &config,
        ),
        assemble_row(
            &table_line(22, "05/11/2018", "077/586l2018", 95.0),
            &columns,
            &config,
        ),
        assemble_row(
            &table_line(120, "05/11/2018", "077/586/2018", 80.0),
            &columns,
            &config,
        ),
        assemble_row(
            &table_line(160, "06/11/2018", "077/587/2018", 85.0),
            &columns,
            &config,
        ),
    ];

    let merged = deduplicate_rows(rows, &config);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].text(ColumnKind::RecordNumber), "077/586/2018");
    assert_eq!(merged[0].cell(ColumnKind::RecordNumber).confidence, 90.0);
    assert_eq!(merged[0].y(), Some(20));
    assert_eq!(merged[1].text(ColumnKind::RecordNumber), "077/587/2018");
}

#[test]
fn normalize_address_corrects_street_typo() {
    let address = normalize_address(
        "2/121-130A Main North Raod MEDINDIE GARDENS SA 5083",
        &vocabulary(),
        &PipelineConfig::default(),
    );

    assert_eq!(
        address.text,
        "2/121-130A Main North Road MEDINDIE GARDENS SA 5083"
    );
    assert_eq!(address.street_number, "2/121-130A");
    assert_eq!(address.street.as_deref(), Some("Main North Road"));
    assert_eq!(address.suburb.as_deref(), Some("MEDINDIE GARDENS"));
    assert!(address.has_numbered_street());
}

#[test]
fn normalize_address_rejoins_suburb_split_by_spurious_space() {
    let address = normalize_address(
        "14 Prospect Road MEDIN DIE GARDENS",
        &vocabulary(),
        &PipelineConfig::default(),
    );
    assert_eq!(address.text, "14 Prospect Road MEDINDIE GARDENS");
}

#[test]
fn normalize_address_gives_up_without_recognized_suburb() {
    let raw = "12 Smith Street NOWHERESVILLE SA 5000";
    let address = normalize_address(raw, &vocabulary(), &PipelineConfig::default());

    assert_eq!(address.text, raw);
    assert!(address.suburb.is_none());
    assert!(address.street.is_none());
    assert!(!address.has_numbered_street());
}

#[test]
fn normalize_address_keeps_suburb_fix_when_street_is_unknown() {
    let address = normalize_address(
        "5 Unknownia Lane PROSPCT",
        &vocabulary(),
        &PipelineConfig::default(),
    );

    assert_eq!(address.text, "5 Unknownia Lane PROSPECT");
    assert_eq!(address.suburb.as_deref(), Some("PROSPECT"));
    assert!(address.street.is_none());
    assert_eq!(address.street_number, "5");
}

#[test]
fn street_number_tokens_are_recognized() {
    for token in ["12", "7A", "2/121-130A", "1", "&", "10-12"] {
        assert!(is_street_number_token(token), "{token} should be a number");
    }
    for token in ["Main", "Rd", "12AB", "A1", "12-"] {
        assert!(
            !is_street_number_token(token),
            "{token} should not be a number"
        );
    }
}

#[test]
fn closest_match_is_case_insensitive_and_bounded() {
    let vocabulary = vocabulary();
    let matched =
        closest_match("kilbrun", &vocabulary.suburb_names, 2).map(|entry| entry.canonical.as_str());
    assert_eq!(matched, Some("KILBURN"));
    assert!(closest_match("KILBRUNX", &vocabulary.suburb_names, 2).is_none());
}

#[test]
fn correct_free_text_replaces_exact_letter_runs_only() {
    let misspellings = vocabulary().misspellings;
    assert_eq!(
        correct_free_text("Dweling-addition & verandan (2)", &misspellings),
        "Dwelling-addition & verandah (2)"
    );
    assert_eq!(
        correct_free_text("Dwelings verandans", &misspellings),
        "Dwelings verandans"
    );
    assert_eq!(correct_free_text("", &misspellings), "");
}

#[test]
fn normalize_received_date_outputs_iso_or_empty() {
    assert_eq!(normalize_received_date("05/11/2018"), "2018-11-05");
    assert_eq!(normalize_received_date("5/11/18"), "2018-11-05");
    assert_eq!(normalize_received_date("05/1 1/2018"), "2018-11-05");
    assert_eq!(normalize_received_date("31/02/2018"), "");
    assert_eq!(normalize_received_date("O5/11/2018"), "");
    assert_eq!(normalize_received_date("05/11/201"), "");
    assert_eq!(normalize_received_date("05/11/8"), "");
    assert_eq!(normalize_received_date("05/11/0"), "");
    assert_eq!(normalize_received_date("05/11/20188"), "");
    assert_eq!(normalize_received_date("05/11/+018"), "");
    assert_eq!(normalize_received_date(""), "");
}

#[test]
fn record_filter_rejects_weak_record_number_even_when_rest_is_perfect() {
    let config = PipelineConfig::default();
    let filter = RecordFilter::new(&config).expect("filter should build");
    let vocabulary = vocabulary();
    let columns = table_columns();

    let row = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 65.0),
        &columns,
        &config,
    );
    let address = normalize_address(&row.text(ColumnKind::Address), &vocabulary, &config);
    assert_eq!(
        filter.evaluate(&row, &address),
        Err(RecordRejection::RecordNumberConfidence(65.0))
    );

    let row = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 70.0),
        &columns,
        &config,
    );
    let address = normalize_address(&row.text(ColumnKind::Address), &vocabulary, &config);
    assert_eq!(filter.evaluate(&row, &address), Ok(()));
}

#[test]
fn record_filter_checks_format_position_and_address() {
    let config = PipelineConfig::default();
    let filter = RecordFilter::new(&config).expect("filter should build");
    let vocabulary = vocabulary();
    let columns = table_columns();

    let row = assemble_row(
        &table_line(20, "05/11/2018", "077/586l2018", 90.0),
        &columns,
        &config,
    );
    let address = normalize_address(&row.text(ColumnKind::Address), &vocabulary, &config);
    assert_eq!(
        filter.evaluate(&row, &address),
        Err(RecordRejection::MalformedRecordNumber(
            "077/586l2018".to_string()
        ))
    );

    let mut unplaced = row_with_number("077/586/2018", 90.0);
    unplaced.cells[0].y = None;
    assert_eq!(
        filter.evaluate(&unplaced, &address),
        Err(RecordRejection::MissingPosition)
    );

    let row = assemble_row(
        &table_line(20, "05/11/2018", "077/586/2018", 90.0),
        &columns,
        &config,
    );
    let unknown = normalize_address("12 Smith Street NOWHERESVILLE", &vocabulary, &config);
    assert_eq!(
        filter.evaluate(&row, &unknown),
        Err(RecordRejection::UnrecognizedSuburb)
    );
    let no_number = normalize_address("Main North Road PROSPECT", &vocabulary, &config);
    assert_eq!(
        filter.evaluate(&row, &no_number),
        Err(RecordRejection::UnrecognizedStreet)
    );

    let address = normalize_address(&row.text(ColumnKind::Address), &vocabulary, &config);
    let mut weak_address = row.clone();
    weak_address.cells[ColumnKind::Address.index()].confidence = 74.0;
    assert_eq!(
        filter.evaluate(&weak_address, &address),
        Err(RecordRejection::AddressConfidence(74.0))
    );
    weak_address.cells[ColumnKind::Address.index()].confidence = 75.0;
    assert_eq!(filter.evaluate(&weak_address, &address), Ok(()));

    let mut unnumbered = row.clone();
    unnumbered.cells[ColumnKind::RecordNumber.index()] = Cell {
        y: Some(20),
        texts: Vec::new(),
        confidence: 0.0,
    };
    assert_eq!(
        filter.evaluate(&unnumbered, &address),
        Err(RecordRejection::EmptyRecordNumber)
    );
}

#[test]
fn remove_horizontal_rules_fills_from_previous_row() {
    let config = PipelineConfig {
        column_gap: 2,
        ..PipelineConfig::default()
    };
    let white = Rgba([255, 255, 255, 255]);
    let black = Rgba([0, 0, 0, 255]);
    let mut image = RgbaImage::from_pixel(20, 6, white);
    for x in 0..20 {
        image.put_pixel(x, 0, black);
        image.put_pixel(x, 2, black);
        image.put_pixel(x, 3, black);
    }
    for x in 0..5 {
        image.put_pixel(x, 4, black);
    }
    image.put_pixel(3, 2, Rgba([0, 0, 0, 0]));

    let removed = remove_horizontal_rules(&mut image, &config);

    assert_eq!(removed, 2);
    assert_eq!(*image.get_pixel(7, 0), black);
    assert!((0..20).all(|x| *image.get_pixel(x, 2) == white));
    assert!((0..20).all(|x| *image.get_pixel(x, 3) == white));
    assert_eq!(*image.get_pixel(2, 4), black);
}

#[test]
fn band_windows_overlap_and_upsample() {
    let config = PipelineConfig {
        section_height: 10,
        section_step: 5,
        upscale_factor: 2,
        ..PipelineConfig::default()
    };
    let image = RgbaImage::from_pixel(10, 23, Rgba([255, 255, 255, 255]));

    assert_eq!(band_tops(23, &config), vec![0, 5, 10, 15]);
    assert!(band_tops(0, &config).is_empty());

    let bands = BandWindows::new(&image, &config)
        .map(|band| (band.top, band.image.dimensions()))
        .collect::<Vec<_>>();
    assert_eq!(
        bands,
        vec![(0, (20, 20)), (5, (20, 20)), (10, (20, 20)), (15, (20, 16))]
    );
}

#[test]
fn translate_band_lines_scales_back_and_offsets() {
    let lines = vec![
        OcrLine {
            words: vec![
                OcrWord {
                    text: "later".to_string(),
                    confidence: 120.0,
                    choice_count: 2,
                    bbox: OcrBox {
                        x0: 300,
                        y0: 60,
                        x1: 360,
                        y1: 96,
                    },
                },
                OcrWord {
                    text: " first ".to_string(),
                    confidence: 80.0,
                    choice_count: 1,
                    bbox: OcrBox {
                        x0: 30,
                        y0: 60,
                        x1: 90,
                        y1: 96,
                    },
                },
            ],
        },
        OcrLine {
            words: vec![OcrWord {
                text: "  ".to_string(),
                confidence: 80.0,
                choice_count: 1,
                bbox: OcrBox {
                    x0: 0,
                    y0: 0,
                    x1: 3,
                    y1: 3,
                },
            }],
        },
    ];

    let translated = translate_band_lines(lines, 10, 3);
    assert_eq!(translated.len(), 1);
    let words = &translated[0].words;
    assert_eq!(words[0].text, "first");
    assert_eq!(
        words[0].bounds,
        Bounds {
            x: 10,
            y: 30,
            width: 20,
            height: 12
        }
    );
    assert_eq!(words[1].confidence, 100.0);
    assert_eq!(words[1].choice_count, 2);
}

struct ScriptedEngine {
    responses: Vec<Vec<OcrLine>>,
    calls: usize,
    resets: usize,
}

impl OcrEngine for ScriptedEngine {
    fn recognize(&mut self, _band: &RgbaImage) -> Result<Vec<OcrLine>> {
        let response = self.responses.get(self.calls).cloned().unwrap_or_default();
        self.calls += 1;
        Ok(response)
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

fn band_line(line: &Line, band_top: i32, factor: i32) -> OcrLine {
    OcrLine {
        words: line
            .words
            .iter()
            .map(|word| OcrWord {
                text: word.text.clone(),
                confidence: word.confidence,
                choice_count: 1,
                bbox: OcrBox {
                    x0: word.bounds.x * factor,
                    y0: (word.bounds.y - band_top) * factor,
                    x1: word.bounds.right() * factor,
                    y1: (word.bounds.y - band_top + word.bounds.height) * factor,
                },
            })
            .collect(),
    }
}

#[test]
fn overlapping_bands_merge_to_well_shaped_record_number() {
    let config = PipelineConfig::default();
    let vocabulary = vocabulary();
    let pipeline = TablePipeline::new(&config, &vocabulary).expect("pipeline should build");
    let factor = config.upscale_factor as i32;

    let band_a = table_line(20, "05/11/2018", "077/586l2018", 91.0);
    let band_b = table_line(20, "05/11/2018", "077/586/2018", 70.0);
    let mut engine = ScriptedEngine {
        responses: vec![
            vec![band_line(&band_a, 0, factor)],
            vec![band_line(&band_b, 10, factor)],
        ],
        calls: 0,
        resets: 0,
    };

    let image = RgbaImage::from_pixel(1400, 70, Rgba([255, 255, 255, 255]));
    let outcome = pipeline
        .process_image(image, &mut engine, &context())
        .expect("pipeline should run");

    assert_eq!(engine.calls, 2);
    assert_eq!(engine.resets, 2);
    assert_eq!(outcome.stats.bands, 2);
    assert!(outcome.stats.columns_found);
    assert_eq!(outcome.stats.rows_assembled, 2);
    assert_eq!(outcome.stats.rows_merged, 1);
    assert_eq!(outcome.records.len(), 1);

    let record = &outcome.records[0];
    assert_eq!(record.record_number, "077/586/2018");
    assert_eq!(
        record.address,
        "2/121-130A Main North Road MEDINDIE GARDENS SA 5083"
    );
    assert_eq!(record.street_name, "Main North Road");
    assert_eq!(record.suburb, "MEDINDIE GARDENS");
    assert_eq!(record.description, "Dwelling addition");
    assert_eq!(record.applicant, "J Smith");
    assert_eq!(record.received_date, "2018-11-05");
    assert_eq!(record.source_url, context().source_url);
    assert_eq!(record.scrape_date, "2018-11-20");
}

#[test]
fn image_without_columns_yields_no_records() {
    let config = PipelineConfig::default();
    let vocabulary = vocabulary();
    let pipeline = TablePipeline::new(&config, &vocabulary).expect("pipeline should build");

    let outcome = pipeline.reconstruct(
        &[Line {
            words: vec![word("Register", 30, 10, 120, 95.0)],
        }],
        &context(),
        ImageStats::default(),
    );

    assert!(outcome.records.is_empty());
    assert!(!outcome.stats.columns_found);
    assert_eq!(outcome.stats.lines, 1);
}
