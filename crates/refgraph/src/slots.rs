//! Plans where externally defined entities would land under `components`.

use serde::Serialize;
use serde_json::Value;

use crate::extract::reference_occurrences;
use crate::pointer::{
    classify, encode_segment, entity_name, key_path, local_fragment, pointer_from_segments,
    strip_local_fragment, to_root_pointer, KeyPath, RefKind,
};

/// Where a referenced entity goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// A new slot under `#/components/...`.
    Component { pointer: String },
    /// The reference already lives inside `components`.
    InComponents,
    /// No component category encloses the reference.
    Unplaced,
}

/// Placement plan for one `$ref` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSlot {
    /// The `$ref` value as written.
    pub reference: String,
    pub kind: RefKind,
    /// Pointer to the mapping holding the `$ref`.
    pub location: String,
    pub key_path: KeyPath,
    /// Last segment of the reference's local fragment; empty for whole files.
    pub entity: String,
    pub placement: Placement,
}

/// Plan component slots for every external and remote `$ref` in `root`.
///
/// Local references are left out; they already point into the document.
pub fn plan_component_slots(root: &Value) -> Vec<ComponentSlot> {
    reference_occurrences(root)
        .into_iter()
        .filter_map(|occurrence| {
            let kind = classify(&occurrence.reference);
            if kind == RefKind::Local {
                return None;
            }
            let reference = occurrence.reference;
            let fragment = local_fragment(&reference);
            let key_path = key_path(
                &occurrence.ancestors,
                strip_local_fragment(&reference),
                fragment,
            );
            let placement = if key_path.in_components {
                Placement::InComponents
            } else if key_path.is_empty() {
                Placement::Unplaced
            } else {
                Placement::Component {
                    pointer: to_root_pointer(encode_segment, &reference, &key_path.segments),
                }
            };
            Some(ComponentSlot {
                kind,
                location: pointer_from_segments(&occurrence.ancestors),
                entity: entity_name(fragment),
                key_path,
                placement,
                reference,
            })
        })
        .collect()
}
