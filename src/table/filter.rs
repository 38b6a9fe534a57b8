use anyhow::{Context, Result};
use regex::Regex;

use super::normalize::NormalizedAddress;
use super::{ColumnKind, Row};
use crate::config::PipelineConfig;

const RECORD_NUMBER_PATTERN: &str = r"^\d{2,4}/\d{1,6}/\d{4}$";

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RecordRejection {
    MissingPosition,
    EmptyRecordNumber,
    MalformedRecordNumber(String),
    RecordNumberConfidence(f64),
    AddressConfidence(f64),
    UnrecognizedSuburb,
    UnrecognizedStreet,
}

pub(super) struct RecordFilter {
    record_number_pattern: Regex,
    record_number_min_confidence: f64,
    address_min_confidence: f64,
}

impl RecordFilter {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            record_number_pattern: Regex::new(RECORD_NUMBER_PATTERN)
                .context("failed to compile record number regex")?,
            record_number_min_confidence: config.record_number_min_confidence,
            address_min_confidence: config.address_min_confidence,
        })
    }

    pub fn evaluate(&self, row: &Row, address: &NormalizedAddress) -> Result<(), RecordRejection> {
        if row.y().is_none() {
            return Err(RecordRejection::MissingPosition);
        }

        let record_number = row.text(ColumnKind::RecordNumber);
        let record_number = record_number.trim();
        if record_number.is_empty() {
            return Err(RecordRejection::EmptyRecordNumber);
        }
        if !self.record_number_pattern.is_match(record_number) {
            return Err(RecordRejection::MalformedRecordNumber(
                record_number.to_string(),
            ));
        }

        let record_number_confidence = row.cell(ColumnKind::RecordNumber).confidence;
        if record_number_confidence < self.record_number_min_confidence {
            return Err(RecordRejection::RecordNumberConfidence(
                record_number_confidence,
            ));
        }

        let address_confidence = row.cell(ColumnKind::Address).confidence;
        if address_confidence < self.address_min_confidence {
            return Err(RecordRejection::AddressConfidence(address_confidence));
        }

        if address.suburb.is_none() {
            return Err(RecordRejection::UnrecognizedSuburb);
        }
        if !address.has_numbered_street() {
            return Err(RecordRejection::UnrecognizedStreet);
        }

        Ok(())
    }
}
