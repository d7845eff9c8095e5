//! Small self-identification tables: ethnicities, gender identities and
//! sexual orientations

use super::{extract_entities, EntityShape, ExtractContext};
use crate::error::Result;
use crate::types::Record;
use crate::xml::{Field, Namespace};
use roxmltree::Node;

const ETHNICITY: EntityShape = EntityShape {
    element: "Ethnicity",
    reference: "Ethnicity_Reference",
    data: "Ethnicity_Data",
    fields: &[
        Field::Text("ID"),
        Field::Text("Name"),
        Field::Text("Description"),
        Field::References("Location_Reference"),
        Field::References("Ethnicity_Mapping_Reference"),
        Field::Text("Inactive"),
    ],
};

const GENDER_IDENTITY: EntityShape = EntityShape {
    element: "Gender_Identity",
    reference: "Gender_Identity_Reference",
    data: "Gender_Identity_Data",
    fields: &[
        Field::Text("ID"),
        Field::Text("Gender_Identity_Name"),
        Field::Text("Gender_Identity_Code"),
        Field::Text("Gender_Identity_Description"),
        Field::Text("Gender_Identity_Inactive"),
    ],
};

const SEXUAL_ORIENTATION: EntityShape = EntityShape {
    element: "Sexual_Orientation",
    reference: "Sexual_Orientation_Reference",
    data: "Sexual_Orientation_Data",
    fields: &[
        Field::Text("ID"),
        Field::Text("Sexual_Orientation_Name"),
        Field::Text("Sexual_Orientation_Code"),
        Field::Text("Sexual_Orientation_Description"),
        Field::Text("Sexual_Orientation_Inactive"),
    ],
};

pub(super) fn extract_ethnicities(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &ETHNICITY)
}

pub(super) fn extract_gender_identities(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &GENDER_IDENTITY)
}

pub(super) fn extract_sexual_orientations(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &SEXUAL_ORIENTATION)
}
