use super::{
    RawStatsBlock,
    Rollup,
    StatField,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A stat value exactly as the server reported it, tagged with its rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricValue {
    pub value: String,
    pub rollup: Rollup,
}

/// Typed metrics of one server.
///
/// Fields whose stat key was missing from the response are absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServerMetrics {
    fields: BTreeMap<StatField, MetricValue>,
}

impl ServerMetrics {
    /// Maps every known stat key of `raw` onto its field; unknown keys are dropped.
    pub fn translate(raw: &RawStatsBlock) -> Self {
        let fields = raw
            .iter()
            .filter_map(|(key, value)| {
                let field = StatField::from_key(key)?;
                Some((
                    field,
                    MetricValue {
                        value: value.to_string(),
                        rollup: Rollup::OBSERVED,
                    },
                ))
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: StatField) -> Option<&MetricValue> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: StatField) -> Option<&str> {
        self.get(field).map(|metric| metric.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatField, &MetricValue)> {
        self.fields.iter().map(|(field, metric)| (*field, metric))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
