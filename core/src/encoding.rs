//! Categorical encoding shared between the modelling stages.
//!
//! Each column's map is built once, on first encounter, from the sorted
//! distinct values of that column. After that it is append-only: a value
//! never seen before gets the next free code, and an existing value keeps
//! its code for the rest of the run. Both models therefore see the same
//! category → code assignment.

use crate::{
    error::{AnalysisError, Warning},
    features::DerivedLoan,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Categorical columns fed to the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CategoricalColumn {
    ProductName,
    ProductType,
    ServicerName,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 3] = [
        CategoricalColumn::ProductName,
        CategoricalColumn::ProductType,
        CategoricalColumn::ServicerName,
    ];

    /// Feature name used in importance listings.
    pub fn feature_name(&self) -> &'static str {
        match self {
            Self::ProductName  => "product_name_encoded",
            Self::ProductType  => "product_type_encoded",
            Self::ServicerName => "servicer_name_encoded",
        }
    }

    pub fn value<'a>(&self, loan: &'a DerivedLoan) -> &'a str {
        match self {
            Self::ProductName  => &loan.record.product_name,
            Self::ProductType  => &loan.record.product_type,
            Self::ServicerName => &loan.record.servicer_name,
        }
    }
}

/// Stable string → integer codes for one column.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryEncodingMap {
    codes: BTreeMap<String, u32>,
}

impl CategoryEncodingMap {
    /// Codes follow sorted order of the initial distinct values.
    fn from_values<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = values.collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v.to_string(), i as u32))
            .collect();
        Self { codes }
    }

    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Existing code, or the next free one for an unseen value.
    pub fn code_or_insert(&mut self, value: &str) -> u32 {
        if let Some(code) = self.codes.get(value) {
            return *code;
        }
        let next = self.codes.len() as u32;
        self.codes.insert(value.to_string(), next);
        next
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// All encoding maps for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EncodingTable {
    maps: BTreeMap<CategoricalColumn, CategoryEncodingMap>,
}

impl EncodingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, column: CategoricalColumn) -> Option<&CategoryEncodingMap> {
        self.maps.get(&column)
    }

    /// Encode one column for every loan, building the map on first use.
    /// Fewer than two distinct values is reported as a warning.
    pub fn encode_column(
        &mut self,
        column: CategoricalColumn,
        loans: &[DerivedLoan],
        stage: &'static str,
        warnings: &mut Vec<Warning>,
    ) -> Vec<f64> {
        let map = self.maps.entry(column).or_insert_with(|| {
            log::debug!("encoding: building map for {column:?}");
            CategoryEncodingMap::from_values(loans.iter().map(|l| column.value(l)))
        });
        let encoded: Vec<f64> = loans
            .iter()
            .map(|l| map.code_or_insert(column.value(l)) as f64)
            .collect();

        let distinct: BTreeSet<&str> = loans.iter().map(|l| column.value(l)).collect();
        if distinct.len() < 2 {
            let err = AnalysisError::DegenerateModelInput {
                stage,
                reason: format!("column {column:?} has {} distinct value(s)", distinct.len()),
            };
            log::warn!("{err}");
            warnings.push(Warning::from_error(stage, &err));
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_order() {
        let map = CategoryEncodingMap::from_values(["VA Loan", "FHA Loan", "Jumbo Loan"].into_iter());
        assert_eq!(map.code("FHA Loan"), Some(0));
        assert_eq!(map.code("Jumbo Loan"), Some(1));
        assert_eq!(map.code("VA Loan"), Some(2));
    }

    #[test]
    fn unseen_values_are_appended_without_renumbering() {
        let mut map = CategoryEncodingMap::from_values(["b", "a"].into_iter());
        assert_eq!(map.code_or_insert("0-first-alphabetically"), 2);
        assert_eq!(map.code("a"), Some(0));
        assert_eq!(map.code("b"), Some(1));
        assert_eq!(map.code_or_insert("a"), 0);
        assert_eq!(map.len(), 3);
    }
}
