//! Organization hierarchies

use super::{extract_entities, EntityShape, ExtractContext};
use crate::error::Result;
use crate::types::Record;
use crate::xml::{Field, Namespace};
use roxmltree::Node;

const HIERARCHY_DATA: &[Field] = &[
    Field::Reference("Top-Level_Organization_Reference"),
    Field::Reference("Superior_Organization_Reference"),
    Field::References("Subordinate_Organization_Reference"),
    Field::References("Included_Organization_Reference"),
    Field::References("Included_In_Organization_Reference"),
];

const ROLE_ASSIGNMENT: &[Field] = &[
    Field::Reference("Role_Reference"),
    Field::References("Role_Assignee_Reference"),
];

const ORGANIZATION_DATA: &[Field] = &[
    Field::Text("Reference_ID"),
    Field::Text("Name"),
    Field::Text("Description"),
    Field::Text("Organization_Code"),
    Field::Text("Include_Manager_in_Name"),
    Field::Text("Include_Organization_Code_in_Name"),
    Field::Text("Include_Organization_ID_in_Name"),
    Field::Reference("Organization_Type_Reference"),
    Field::Reference("Organization_Subtype_Reference"),
    Field::Reference("Organization_Visibility_Reference"),
    Field::Text("Availability_Date"),
    Field::Text("Last_Updated_DateTime"),
    Field::Text("Inactive"),
    Field::Text("Inactive_Date"),
    Field::Reference("Manager_Reference"),
    Field::Reference("Leadership_Reference"),
    Field::Reference("Organization_Owner_Reference"),
    Field::Text("External_URL"),
    Field::Reference("Primary_Location_Reference"),
    Field::Blocks("Roles_Data/Organization_Role_Data", ROLE_ASSIGNMENT),
    Field::Block("Hierarchy_Data", HIERARCHY_DATA),
];

const ORGANIZATION: EntityShape = EntityShape {
    element: "Organization",
    reference: "Organization_Reference",
    data: "Organization_Data",
    fields: ORGANIZATION_DATA,
};

pub(super) fn extract_organizations(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &ORGANIZATION)
}
