// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Named per-element attribute channels
//!
//! Vertices, faces and loops each carry an [`AttributeTable`]: a list of
//! declared channels with one dense column per channel, indexed by the slot
//! index of the element handle. A missing value is `None`.

use crate::error::{GeometryError, GeometryResult};
use serde::{Deserialize, Serialize};

/// Scalar type of an attribute channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeBaseType {
    Float,
    Int,
}

/// Declaration of a named attribute channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub base_type: AttributeBaseType,
    pub dimensions: usize,
}

impl Attribute {
    pub fn new(name: impl Into<String>, base_type: AttributeBaseType, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            base_type,
            dimensions,
        }
    }

    pub fn float(name: impl Into<String>, dimensions: usize) -> Self {
        Self::new(name, AttributeBaseType::Float, dimensions)
    }

    pub fn int(name: impl Into<String>, dimensions: usize) -> Self {
        Self::new(name, AttributeBaseType::Int, dimensions)
    }
}

/// Fixed-length numeric value stored in a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Floats(Vec<f64>),
    Ints(Vec<i64>),
}

/// One value slot per declared channel, in declaration order
pub type AttributeRow = Vec<Option<AttributeValue>>;

impl AttributeValue {
    pub fn base_type(&self) -> AttributeBaseType {
        match self {
            Self::Floats(_) => AttributeBaseType::Float,
            Self::Ints(_) => AttributeBaseType::Int,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Self::Floats(values) => values.len(),
            Self::Ints(values) => values.len(),
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Floats(values) => Some(values),
            Self::Ints(_) => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Ints(values) => Some(values),
            Self::Floats(_) => None,
        }
    }

    /// Whether this value fits the declared type and arity
    pub fn matches(&self, attribute: &Attribute) -> bool {
        self.base_type() == attribute.base_type && self.dimensions() == attribute.dimensions
    }

    fn components(&self) -> Vec<f64> {
        match self {
            Self::Floats(values) => values.clone(),
            Self::Ints(values) => values.iter().map(|&v| v as f64).collect(),
        }
    }

    fn from_components(base_type: AttributeBaseType, components: Vec<f64>) -> Self {
        match base_type {
            AttributeBaseType::Float => Self::Floats(components),
            AttributeBaseType::Int => Self::Ints(components.iter().map(|v| v.round() as i64).collect()),
        }
    }

    /// Blend `from*(1-t) + to*t`; Int channels round to nearest.
    ///
    /// With `t == 1` only `to` is needed (a copy), with `t == 0` only `from`.
    /// Otherwise a missing or mismatched side yields `None`.
    pub fn lerp(from: Option<&Self>, to: Option<&Self>, t: f64) -> Option<Self> {
        match (from, to) {
            (_, Some(to)) if t == 1.0 => Some(to.clone()),
            (Some(from), _) if t == 0.0 => Some(from.clone()),
            (Some(from), Some(to)) => {
                if from.base_type() != to.base_type() || from.dimensions() != to.dimensions() {
                    return None;
                }
                let blended = from
                    .components()
                    .iter()
                    .zip(to.components())
                    .map(|(a, b)| a * (1.0 - t) + b * t)
                    .collect();
                Some(Self::from_components(from.base_type(), blended))
            }
            _ => None,
        }
    }

    /// Componentwise mean; Int channels round to nearest.
    ///
    /// Values that disagree with the first one on type or arity are ignored.
    pub fn mean<'a>(values: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let mut sum = first.components();
        let mut count = 1.0;
        for value in iter {
            if value.base_type() != first.base_type() || value.dimensions() != first.dimensions() {
                continue;
            }
            for (acc, c) in sum.iter_mut().zip(value.components()) {
                *acc += c;
            }
            count += 1.0;
        }
        let mean = sum.into_iter().map(|v| v / count).collect();
        Some(Self::from_components(first.base_type(), mean))
    }
}

/// Blend two attribute rows channel by channel
pub fn lerp_rows(from: &AttributeRow, to: &AttributeRow, t: f64) -> AttributeRow {
    let channels = from.len().max(to.len());
    (0..channels)
        .map(|i| {
            let a = from.get(i).and_then(Option::as_ref);
            let b = to.get(i).and_then(Option::as_ref);
            AttributeValue::lerp(a, b, t)
        })
        .collect()
}

/// Channel declarations plus dense per-slot columns for one element class
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    attributes: Vec<Attribute>,
    columns: Vec<Vec<Option<AttributeValue>>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a channel; redeclaring an identical channel is a no-op
    pub fn declare(&mut self, attribute: Attribute) -> GeometryResult<usize> {
        if let Some(index) = self.position(&attribute.name) {
            let existing = &self.attributes[index];
            if existing.base_type != attribute.base_type
                || existing.dimensions != attribute.dimensions
            {
                return Err(GeometryError::AttributeMismatch {
                    name: attribute.name,
                    details: format!(
                        "already declared as {:?}x{}",
                        existing.base_type, existing.dimensions
                    ),
                });
            }
            return Ok(index);
        }
        if attribute.dimensions == 0 {
            return Err(GeometryError::AttributeMismatch {
                name: attribute.name,
                details: "dimensions must be at least 1".to_string(),
            });
        }
        self.attributes.push(attribute);
        self.columns.push(Vec::new());
        Ok(self.attributes.len() - 1)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Number of declared channels
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn get(&self, channel: usize, slot: usize) -> Option<&AttributeValue> {
        self.columns.get(channel)?.get(slot)?.as_ref()
    }

    pub fn get_by_name(&self, name: &str, slot: usize) -> Option<&AttributeValue> {
        self.get(self.position(name)?, slot)
    }

    /// Store a value, checking it against the channel declaration
    pub fn set(&mut self, channel: usize, slot: usize, value: AttributeValue) -> GeometryResult<()> {
        let attribute = self
            .attributes
            .get(channel)
            .ok_or_else(|| GeometryError::UnknownAttribute(format!("#{}", channel)))?;
        if !value.matches(attribute) {
            return Err(GeometryError::AttributeMismatch {
                name: attribute.name.clone(),
                details: format!(
                    "expected {:?}x{}, got {:?}x{}",
                    attribute.base_type,
                    attribute.dimensions,
                    value.base_type(),
                    value.dimensions()
                ),
            });
        }
        self.store(channel, slot, Some(value));
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, slot: usize, value: AttributeValue) -> GeometryResult<()> {
        let channel = self
            .position(name)
            .ok_or_else(|| GeometryError::UnknownAttribute(name.to_string()))?;
        self.set(channel, slot, value)
    }

    fn store(&mut self, channel: usize, slot: usize, value: Option<AttributeValue>) {
        let column = &mut self.columns[channel];
        if column.len() <= slot {
            if value.is_none() {
                return;
            }
            column.resize(slot + 1, None);
        }
        column[slot] = value;
    }

    /// Snapshot every channel value of a slot
    pub fn row(&self, slot: usize) -> AttributeRow {
        (0..self.attributes.len()).map(|c| self.get(c, slot).cloned()).collect()
    }

    /// Restore a row taken with [`AttributeTable::row`]. Mismatched values are dropped.
    pub fn set_row(&mut self, slot: usize, row: &AttributeRow) {
        for (channel, value) in row.iter().enumerate().take(self.attributes.len()) {
            let value = value
                .as_ref()
                .filter(|v| v.matches(&self.attributes[channel]))
                .cloned();
            self.store(channel, slot, value);
        }
    }

    /// Forget every value of a slot (the slot is being freed)
    pub fn clear(&mut self, slot: usize) {
        for column in &mut self.columns {
            if let Some(value) = column.get_mut(slot) {
                *value = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_lerp() {
        let a = AttributeValue::Floats(vec![0.0, 10.0]);
        let b = AttributeValue::Floats(vec![1.0, 20.0]);
        let mid = AttributeValue::lerp(Some(&a), Some(&b), 0.25).unwrap();
        assert_eq!(mid, AttributeValue::Floats(vec![0.25, 12.5]));
    }

    #[test]
    fn test_int_lerp_rounds() {
        let a = AttributeValue::Ints(vec![0, 1]);
        let b = AttributeValue::Ints(vec![3, 2]);
        let mid = AttributeValue::lerp(Some(&a), Some(&b), 0.5).unwrap();
        // 1.5 rounds away from zero
        assert_eq!(mid, AttributeValue::Ints(vec![2, 2]));
    }

    #[test]
    fn test_lerp_copy_and_missing() {
        let b = AttributeValue::Floats(vec![4.0]);
        assert_eq!(AttributeValue::lerp(None, Some(&b), 1.0), Some(b.clone()));
        assert_eq!(AttributeValue::lerp(Some(&b), None, 0.0), Some(b.clone()));
        assert_eq!(AttributeValue::lerp(None, Some(&b), 0.5), None);
        assert_eq!(AttributeValue::lerp(Some(&b), None, 0.5), None);
    }

    #[test]
    fn test_lerp_type_mismatch() {
        let a = AttributeValue::Floats(vec![1.0]);
        let b = AttributeValue::Ints(vec![1]);
        assert_eq!(AttributeValue::lerp(Some(&a), Some(&b), 0.5), None);
    }

    #[test]
    fn test_mean() {
        let values = [
            AttributeValue::Ints(vec![1]),
            AttributeValue::Ints(vec![2]),
            AttributeValue::Ints(vec![2]),
        ];
        assert_eq!(AttributeValue::mean(values.iter()), Some(AttributeValue::Ints(vec![2])));

        let floats = [AttributeValue::Floats(vec![1.0, 0.0]), AttributeValue::Floats(vec![2.0, 1.0])];
        assert_eq!(
            AttributeValue::mean(floats.iter()),
            Some(AttributeValue::Floats(vec![1.5, 0.5]))
        );
        assert_eq!(AttributeValue::mean(std::iter::empty()), None);
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut table = AttributeTable::new();
        let a = table.declare(Attribute::float("uv", 2)).unwrap();
        let b = table.declare(Attribute::float("uv", 2)).unwrap();
        assert_eq!(a, b);
        assert!(table.declare(Attribute::int("uv", 2)).is_err());
        assert!(table.declare(Attribute::float("empty", 0)).is_err());
    }

    #[test]
    fn test_set_checks_declaration() {
        let mut table = AttributeTable::new();
        table.declare(Attribute::float("uv", 2)).unwrap();
        assert!(table.set_by_name("uv", 3, AttributeValue::Floats(vec![0.5, 0.5])).is_ok());
        assert!(table.set_by_name("uv", 3, AttributeValue::Floats(vec![0.5])).is_err());
        assert!(table.set_by_name("missing", 3, AttributeValue::Ints(vec![1])).is_err());
        assert_eq!(
            table.get_by_name("uv", 3),
            Some(&AttributeValue::Floats(vec![0.5, 0.5]))
        );
        assert!(table.get_by_name("uv", 0).is_none());
    }

    #[test]
    fn test_row_roundtrip_and_clear() {
        let mut table = AttributeTable::new();
        table.declare(Attribute::float("a", 1)).unwrap();
        table.declare(Attribute::int("b", 1)).unwrap();
        table.set(0, 1, AttributeValue::Floats(vec![2.0])).unwrap();

        let row = table.row(1);
        assert_eq!(row, vec![Some(AttributeValue::Floats(vec![2.0])), None]);

        table.set_row(5, &row);
        assert_eq!(table.get(0, 5), Some(&AttributeValue::Floats(vec![2.0])));

        table.clear(5);
        assert!(table.get(0, 5).is_none());
    }
}
