//! Format-preserving catalog edits on the JSON concrete syntax tree

use jsonc_parser::ParseOptions;
use jsonc_parser::cst::{
    CstInputValue,
    CstObject,
    CstRootNode,
};

use super::DotPath;

/// Applies leaf writes to `json_text`, keeping untouched properties, indentation and
/// key order as they were.
///
/// Existing properties are updated in place; new ones are appended to their parent object,
/// creating intermediate objects on the way. Returns `None` when the text cannot be parsed
/// or a path runs through a non-object value.
#[must_use]
pub fn apply_writes_to_json_text(json_text: &str, writes: &[(DotPath, String)]) -> Option<String> {
    let root = CstRootNode::parse(json_text, &ParseOptions::default()).ok()?;
    let root_obj = root.object_value_or_set();

    for (path, value) in writes {
        set_leaf(&root_obj, path, value)?;
    }

    Some(root.to_string())
}

/// Sets one string property, creating parent objects as needed.
fn set_leaf(root_obj: &CstObject, path: &DotPath, value: &str) -> Option<()> {
    let (last, parents) = path.split_last()?;

    let mut current_obj = root_obj.clone();
    for part in parents {
        current_obj = match current_obj.get(part) {
            Some(prop) => prop.value()?.as_object()?,
            None => current_obj.object_value_or_set(part),
        };
    }

    match current_obj.get(last) {
        Some(prop) => {
            prop.set_value(CstInputValue::String(value.to_string()));
        }
        None => {
            current_obj.append(last, CstInputValue::String(value.to_string()));
        }
    }
    Some(())
}
