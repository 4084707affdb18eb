//! Per-round merging of streamed tool-call fragments.

use std::collections::BTreeMap;

use tracing::warn;

use super::delta::ToolCallFragment;
use crate::types::ToolCallRecord;

/// Merges tool-call fragments by slot index for one round.
///
/// Ids and names are replaced only by non-empty values; argument text is
/// appended in arrival order. The result does not depend on how finely the
/// upstream split its payloads, only on per-slot arrival order.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: BTreeMap<u32, ToolCallFragment>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, fragment: ToolCallFragment) {
        let slot = self
            .slots
            .entry(fragment.index)
            .or_insert_with(|| ToolCallFragment {
                index: fragment.index,
                ..Default::default()
            });
        if !fragment.id.is_empty() {
            slot.id = fragment.id;
        }
        if !fragment.name.is_empty() {
            slot.name = fragment.name;
        }
        slot.arguments.push_str(&fragment.arguments);
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = ToolCallFragment>) {
        for fragment in fragments {
            self.merge(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The merged state of one slot so far.
    pub fn slot(&self, index: u32) -> Option<&ToolCallFragment> {
        self.slots.get(&index)
    }

    /// Build the final records in ascending slot order.
    pub fn finish(self) -> Vec<ToolCallRecord> {
        self.slots.into_values().map(build_record).collect()
    }
}

fn build_record(slot: ToolCallFragment) -> ToolCallRecord {
    let id = if slot.id.is_empty() {
        format!("call_{}", slot.index)
    } else {
        slot.id
    };
    ToolCallRecord {
        arguments: parse_arguments(&slot.name, &slot.arguments),
        id,
        name: slot.name,
        raw_arguments: slot.arguments,
    }
}

fn parse_arguments(tool_name: &str, raw: &str) -> serde_json::Value {
    let empty = || serde_json::Value::Object(serde_json::Map::new());
    if raw.trim().is_empty() {
        return empty();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            warn!(tool = tool_name, "tool arguments are not a JSON object");
            empty()
        }
        Err(err) => {
            warn!(tool = tool_name, error = %err, "unparseable tool arguments");
            empty()
        }
    }
}
