//! Tabular training data.
//!
//! A [`TrainingSet`] is read from a comma-separated file whose first line must match
//! the column list of a [`Schema`] exactly. Every other line becomes one [`Instance`]:
//! the schema's attribute columns in order plus a binary classification label.
//!
//! Instances `[0, training_instance_count)` form the training partition and the rest
//! form the held-out testing partition.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How the raw token of an attribute column is read.
pub enum AttributeKind {
    /// A decimal number.
    Numeric,
    /// One of `P` (positive, 2), `A` (average, 1) or `N` (negative, 0).
    Qualitative,
}

impl AttributeKind {
    /// Parse one raw token. Non-finite numbers are rejected.
    pub fn parse(self, token: &str) -> Option<f64> {
        match self {
            AttributeKind::Numeric => token.parse::<f64>().ok().filter(|v| v.is_finite()),
            AttributeKind::Qualitative => match token {
                "P" => Some(2.0),
                "A" => Some(1.0),
                "N" => Some(0.0),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// An input attribute and the fixed domain range used to normalize it into `[0, 1]`.
pub struct Attribute {
    /// Column name in the file header.
    pub column: &'static str,
    /// Human readable name.
    pub name: &'static str,
    pub kind: AttributeKind,
    pub min: f64,
    pub max: f64,
}

impl Attribute {
    /// Maps `value` from `[min, max]` to `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// One column of a training file, in file order.
pub enum Column {
    /// Present in the file but not used (names, years).
    Ignored(&'static str),
    /// The classification token.
    Label(&'static str),
    Attribute(Attribute),
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Ignored(name) | Column::Label(name) => name,
            Column::Attribute(attribute) => attribute.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Layout and domain knowledge of one dataset.
pub struct Schema {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Label token mapped to `1.0`.
    pub positive_label: &'static str,
    /// Label token mapped to `0.0`.
    pub negative_label: &'static str,
}

const fn numeric(column: &'static str, name: &'static str, min: f64, max: f64) -> Column {
    Column::Attribute(Attribute {
        column,
        name,
        kind: AttributeKind::Numeric,
        min,
        max,
    })
}

const fn qualitative(column: &'static str) -> Column {
    Column::Attribute(Attribute {
        column,
        name: column,
        kind: AttributeKind::Qualitative,
        min: 0.0,
        max: 2.0,
    })
}

/// American company bankruptcy records: eighteen balance-sheet sums per company-year,
/// labelled `alive` or `failed`.
pub const AMERICAN_BANKRUPTCY: Schema = Schema {
    name: "american bankruptcy",
    columns: &[
        Column::Ignored("company_name"),
        Column::Label("status_label"),
        Column::Ignored("year"),
        numeric("X1", "current assets", -7.76, 170_000.0),
        numeric("X2", "cost of goods sold", -367.0, 375_000.0),
        numeric("X3", "depreciation and amortization", 0.0, 28_400.0),
        numeric("X4", "financial performance", -21_900.0, 81_700.0),
        numeric("X5", "inventory", 0.0, 62_600.0),
        numeric("X6", "net income", -98_700.0, 105_000.0),
        numeric("X7", "total receivables", -0.01, 65_800.0),
        numeric("X8", "market value", 0.0, 1_070_000.0),
        numeric("X9", "net sales", -1_960.0, 512_000.0),
        numeric("X10", "total assets", 0.0, 532_000.0),
        numeric("X11", "total long-term debt", -0.02, 166_000.0),
        numeric("X12", "EBIT", -25_900.0, 71_200.0),
        numeric("X13", "gross profit", -21_500.0, 137_000.0),
        numeric("X14", "total current liabilities", 0.0, 117_000.0),
        numeric("X15", "retained earnings", -102_000.0, 402_000.0),
        numeric("X16", "total revenue", -1_960.0, 512_000.0),
        numeric("X17", "total liabilities", 0.0, 338_000.0),
        numeric("X18", "total operating expenses", -317.0, 482_000.0),
    ],
    positive_label: "alive",
    negative_label: "failed",
};

/// Qualitative bankruptcy assessments: six expert risk ratings, labelled
/// `NB` (not bankrupt) or `B` (bankrupt).
pub const QUALITATIVE_BANKRUPTCY: Schema = Schema {
    name: "qualitative bankruptcy",
    columns: &[
        qualitative("industrial_risk"),
        qualitative("management_risk"),
        qualitative("financial_flexibility"),
        qualitative("credibility"),
        qualitative("competitiveness"),
        qualitative("operating_risk"),
        Column::Label("class"),
    ],
    positive_label: "NB",
    negative_label: "B",
};

impl Schema {
    /// Attribute columns, in file order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.columns.iter().filter_map(|column| match column {
            Column::Attribute(attribute) => Some(attribute),
            Column::Ignored(_) | Column::Label(_) => None,
        })
    }

    /// Number of attributes, i.e. the network input width this schema feeds.
    pub fn attribute_count(&self) -> usize {
        self.attributes().count()
    }

    /// Map a label token to `1.0` / `0.0`.
    pub fn parse_label(&self, token: &str) -> Option<f64> {
        if token == self.positive_label {
            Some(1.0)
        } else if token == self.negative_label {
            Some(0.0)
        } else {
            None
        }
    }

    /// Normalize raw attribute values in place with this schema's bounds.
    ///
    /// Shape contract: `values.len() == self.attribute_count()`.
    pub fn normalize_attributes(&self, values: &mut [f64]) {
        assert_eq!(
            values.len(),
            self.attribute_count(),
            "got {} attribute values, schema {} has {}",
            values.len(),
            self.name,
            self.attribute_count()
        );
        for (value, attribute) in values.iter_mut().zip(self.attributes()) {
            *value = attribute.normalize(*value);
        }
    }

    fn check_header(&self, header: &StringRecord) -> Result<()> {
        let matches = header.len() == self.columns.len()
            && header
                .iter()
                .zip(self.columns)
                .all(|(field, column)| field == column.name());
        if !matches {
            let expected: Vec<&str> = self.columns.iter().map(Column::name).collect();
            return Err(Error::InvalidData(format!(
                "header `{}` does not match {} columns `{}`",
                header.iter().collect::<Vec<_>>().join(","),
                self.name,
                expected.join(",")
            )));
        }
        Ok(())
    }

    fn parse_record(&self, record: &StringRecord, line: u64) -> Result<Instance> {
        let mut attributes = Vec::with_capacity(self.attribute_count());
        let mut classification = None;

        for (token, column) in record.iter().zip(self.columns) {
            match column {
                Column::Ignored(_) => {}
                Column::Label(name) => {
                    let value = self.parse_label(token).ok_or_else(|| {
                        Error::InvalidData(format!(
                            "line {line}: unknown {name} token `{token}`"
                        ))
                    })?;
                    classification = Some(value);
                }
                Column::Attribute(attribute) => {
                    let value = attribute.kind.parse(token).ok_or_else(|| {
                        Error::InvalidData(format!(
                            "line {line}: invalid {} value `{token}`",
                            attribute.column
                        ))
                    })?;
                    attributes.push(value);
                }
            }
        }

        let classification = classification.ok_or_else(|| {
            Error::InvalidData(format!("line {line}: missing classification"))
        })?;
        Ok(Instance {
            attributes,
            classification,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One row: attribute values (raw or normalized) and the label (`1.0` or `0.0`).
pub struct Instance {
    pub attributes: Vec<f64>,
    pub classification: f64,
}

/// Loaded instances plus the train/test split.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    schema: Schema,
    data: Vec<Instance>,
    loaded: bool,
    normalized: bool,
    training_instance_count: usize,
}

impl TrainingSet {
    /// Empty, not-loaded set for `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            data: Vec::new(),
            loaded: false,
            normalized: false,
            training_instance_count: 0,
        }
    }

    /// Build a loaded set from in-memory instances.
    pub fn from_instances(
        schema: Schema,
        data: Vec<Instance>,
        percent_for_testing: f64,
    ) -> Result<Self> {
        check_percent(percent_for_testing)?;
        let width = schema.attribute_count();
        if let Some(idx) = data.iter().position(|i| i.attributes.len() != width) {
            return Err(Error::InvalidData(format!(
                "instance {idx} has {} attributes, schema {} has {width}",
                data[idx].attributes.len(),
                schema.name
            )));
        }

        let mut set = Self::new(schema);
        set.data = data;
        set.loaded = true;
        set.set_testing(percent_for_testing)?;
        Ok(set)
    }

    /// Replace the contents with the instances read from the file at `path`.
    ///
    /// On any error (unreadable file, header mismatch, malformed row, bad
    /// percentage) the set is left exactly as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P, percent_for_testing: f64) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.load_from_reader(file, percent_for_testing)?;
        info!(
            path = %path.display(),
            instances = self.data.len(),
            training = self.training_instance_count,
            "training set loaded"
        );
        Ok(())
    }

    /// Like [`TrainingSet::load`], reporting failure as `false`.
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P, percent_for_testing: f64) -> bool {
        let path = path.as_ref();
        match self.load(path, percent_for_testing) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load training set");
                false
            }
        }
    }

    /// Replace the contents with the instances read from `reader`.
    pub fn load_from_reader<R: Read>(&mut self, reader: R, percent_for_testing: f64) -> Result<()> {
        check_percent(percent_for_testing)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        self.schema.check_header(reader.headers()?)?;

        let mut data = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map_or(idx as u64 + 2, |p| p.line());
            data.push(self.schema.parse_record(&record, line)?);
        }

        self.data = data;
        self.loaded = true;
        self.normalized = false;
        self.set_testing(percent_for_testing)
    }

    /// Uniformly permute the instances using the thread-local RNG.
    ///
    /// The split index is kept, so the partitions now hold different instances.
    pub fn shuffle(&mut self) {
        self.shuffle_with_rng(&mut rand::thread_rng());
    }

    pub fn shuffle_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.data.shuffle(rng);
    }

    /// Map every attribute into `[0, 1]` with the schema's fixed bounds.
    ///
    /// Calling this again is a no-op.
    pub fn normalize(&mut self) {
        if self.normalized {
            return;
        }
        for instance in &mut self.data {
            self.schema.normalize_attributes(&mut instance.attributes);
        }
        self.normalized = true;
    }

    /// Hold out `floor(len * percent / 100)` instances for testing.
    ///
    /// `percent_for_testing` must lie in the open interval `(0, 100)`.
    pub fn set_testing(&mut self, percent_for_testing: f64) -> Result<()> {
        check_percent(percent_for_testing)?;
        let len = self.data.len();
        let for_testing = (len as f64 * percent_for_testing / 100.0).floor() as usize;
        self.training_instance_count = len - for_testing.min(len);
        Ok(())
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the training partition.
    #[inline]
    pub fn training_instance_count(&self) -> usize {
        self.training_instance_count
    }

    #[inline]
    pub fn instances(&self) -> &[Instance] {
        &self.data
    }

    /// Instances `[0, training_instance_count)`.
    #[inline]
    pub fn training(&self) -> &[Instance] {
        &self.data[..self.training_instance_count]
    }

    /// Instances `[training_instance_count, len)`.
    #[inline]
    pub fn testing(&self) -> &[Instance] {
        &self.data[self.training_instance_count..]
    }
}

fn check_percent(percent: f64) -> Result<()> {
    if !(percent > 0.0 && percent < 100.0) {
        return Err(Error::InvalidConfig(format!(
            "testing percentage must be in (0, 100), got {percent}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const QUALITATIVE: &str = "\
industrial_risk,management_risk,financial_flexibility,credibility,competitiveness,operating_risk,class
P,P,A,A,A,P,NB
N,N,A,P,P,N,NB
A,A,N,N,N,A,B
N,A,N,N,N,N,B
";

    fn american_header() -> String {
        let mut header = String::from("company_name,status_label,year");
        for i in 1..=18 {
            header.push_str(&format!(",X{i}"));
        }
        header
    }

    fn american_row(name: &str, label: &str, value: f64) -> String {
        let mut row = format!("{name},{label},2001");
        for _ in 0..18 {
            row.push_str(&format!(",{value}"));
        }
        row
    }

    fn synthetic(len: usize) -> TrainingSet {
        let data = (0..len)
            .map(|i| Instance {
                attributes: vec![1.0; 6],
                classification: (i % 2) as f64,
            })
            .collect();
        TrainingSet::from_instances(QUALITATIVE_BANKRUPTCY, data, 50.0).unwrap()
    }

    #[test]
    fn loads_qualitative_rows() {
        let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);
        set.load_from_reader(QUALITATIVE.as_bytes(), 25.0).unwrap();

        assert!(set.is_loaded());
        assert!(!set.is_normalized());
        assert_eq!(set.len(), 4);
        assert_eq!(set.training_instance_count(), 3);
        assert_eq!(set.instances()[0].attributes, vec![2.0, 2.0, 1.0, 1.0, 1.0, 2.0]);
        assert_eq!(set.instances()[0].classification, 1.0);
        assert_eq!(set.instances()[3].classification, 0.0);
        assert_eq!(set.testing().len(), 1);
    }

    #[test]
    fn loads_american_rows_with_crlf() {
        let text = format!(
            "{}\r\n{}\r\n{}\r\n",
            american_header(),
            american_row("C_1", "alive", 10.5),
            american_row("C_2", "failed", -3.0)
        );
        let mut set = TrainingSet::new(AMERICAN_BANKRUPTCY);
        set.load_from_reader(text.as_bytes(), 50.0).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.instances()[0].attributes, vec![10.5; 18]);
        assert_eq!(set.instances()[0].classification, 1.0);
        assert_eq!(set.instances()[1].classification, 0.0);
        assert_eq!(set.training_instance_count(), 1);
    }

    #[test]
    fn rejected_load_leaves_state_untouched() {
        let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);
        set.load_from_reader(QUALITATIVE.as_bytes(), 25.0).unwrap();
        let before = set.clone();

        let wrong_header = QUALITATIVE.replacen("class", "label", 1);
        assert!(set.load_from_reader(wrong_header.as_bytes(), 25.0).is_err());

        let bad_token = QUALITATIVE.replacen("P,P,A", "P,X,A", 1);
        assert!(set.load_from_reader(bad_token.as_bytes(), 25.0).is_err());

        let bad_label = QUALITATIVE.replacen(",NB", ",maybe", 1);
        assert!(set.load_from_reader(bad_label.as_bytes(), 25.0).is_err());

        let short_row = format!("{QUALITATIVE}P,P,A\n");
        assert!(set.load_from_reader(short_row.as_bytes(), 25.0).is_err());

        assert!(set.load_from_reader(QUALITATIVE.as_bytes(), 100.0).is_err());
        assert!(set.load_from_reader("".as_bytes(), 25.0).is_err());

        assert_eq!(set, before);

        let mut fresh = TrainingSet::new(QUALITATIVE_BANKRUPTCY);
        assert!(fresh.load_from_reader(bad_token.as_bytes(), 25.0).is_err());
        assert!(!fresh.is_loaded());
    }

    #[test]
    fn american_rows_reject_non_numbers() {
        let text = format!(
            "{}\n{}\n",
            american_header(),
            american_row("C_1", "alive", 1.0).replacen(",1,", ",abc,", 1)
        );
        let mut set = TrainingSet::new(AMERICAN_BANKRUPTCY);
        assert!(set.load_from_reader(text.as_bytes(), 30.0).is_err());
        assert!(!set.is_loaded());
    }

    #[test]
    fn set_testing_floors_held_out_count() {
        let mut set = synthetic(100);
        set.set_testing(30.0).unwrap();
        assert_eq!(set.training_instance_count(), 70);

        let mut set = synthetic(10);
        set.set_testing(25.0).unwrap();
        assert_eq!(set.training_instance_count(), 8);
        assert_eq!(set.training().len(), 8);
        assert_eq!(set.testing().len(), 2);
    }

    #[test]
    fn set_testing_rejects_out_of_range() {
        let mut set = synthetic(10);
        for bad in [0.0, 100.0, -5.0, 150.0, f64::NAN] {
            assert!(set.set_testing(bad).is_err());
        }
        assert_eq!(set.training_instance_count(), 5);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);
        set.load_from_reader(QUALITATIVE.as_bytes(), 25.0).unwrap();

        set.normalize();
        let once = set.clone();
        set.normalize();
        assert_eq!(set, once);
        assert!(set.is_normalized());
        assert_eq!(set.instances()[0].attributes, vec![1.0, 1.0, 0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn american_bounds_map_to_unit_interval() {
        let mut values: Vec<f64> = AMERICAN_BANKRUPTCY.attributes().map(|a| a.min).collect();
        AMERICAN_BANKRUPTCY.normalize_attributes(&mut values);
        assert!(values.iter().all(|v| v.abs() < 1e-12));

        let mut values: Vec<f64> = AMERICAN_BANKRUPTCY.attributes().map(|a| a.max).collect();
        AMERICAN_BANKRUPTCY.normalize_attributes(&mut values);
        assert!(values.iter().all(|v| (v - 1.0).abs() < 1e-12));
        assert_eq!(AMERICAN_BANKRUPTCY.attribute_count(), 18);
    }

    #[test]
    fn shuffle_permutes() {
        let data: Vec<Instance> = (0..50)
            .map(|i| Instance {
                attributes: vec![i as f64; 6],
                classification: 0.0,
            })
            .collect();
        let mut set = TrainingSet::from_instances(QUALITATIVE_BANKRUPTCY, data, 20.0).unwrap();
        let before = set.clone();

        set.shuffle_with_rng(&mut StdRng::seed_from_u64(9));
        assert_ne!(set.instances(), before.instances());
        assert_eq!(set.training_instance_count(), 40);

        let mut keys: Vec<i64> = set.instances().iter().map(|i| i.attributes[0] as i64).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<i64>>());
    }
}
