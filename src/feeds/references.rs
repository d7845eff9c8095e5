//! Reference ID tables, fetched once per category

use super::{ensure_element_content, ExtractContext};
use crate::error::Result;
use crate::types::{attribute_key, JsonValue, Record};
use crate::xml::{data_block, find, find_all, get_attribute, reference_block, Field, Namespace};
use roxmltree::Node;

/// Reference categories the `references` feed fans out over
pub const REFERENCE_CATEGORIES: &[&str] = &[
    "Job_Category_ID",
    "Job_Level_ID",
    "Management_Level_ID",
    "Employee_Type_ID",
    "Contingent_Worker_Type_ID",
    "Position_Time_Type_ID",
    "Pay_Rate_Type_ID",
    "Marital_Status_ID",
    "Military_Status_ID",
    "Termination_Subcategory_ID",
    "General_Event_Subcategory_ID",
    "Event_Classification_Subcategory_ID",
];

const REFERENCE_ID_DATA: &[Field] = &[
    Field::Text("ID"),
    Field::Text("Reference_ID_Type"),
    Field::Text("Referenced_Object_Descriptor"),
];

pub(super) fn extract_references(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    find_all(Some(payload), "Reference_ID", ns)
        .into_iter()
        .map(|reference| -> Result<Record> {
            ensure_element_content(reference, "Reference_ID")?;

            let mut record = Record::new();
            record.insert(
                attribute_key("Descriptor"),
                get_attribute(Some(reference), "Descriptor", ns)
                    .map_or(JsonValue::Null, JsonValue::String),
            );
            record.insert(
                "Reference_ID_Reference".into(),
                reference_block(find(Some(reference), "Reference_ID_Reference", ns), ns),
            );
            record.insert(
                "Reference_ID_Data".into(),
                data_block(
                    find(Some(reference), "Reference_ID_Data", ns),
                    REFERENCE_ID_DATA,
                    ns,
                ),
            );
            Ok(record)
        })
        .collect()
}
