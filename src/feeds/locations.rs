//! Locations and their contact data

use super::{extract_entities, EntityShape, ExtractContext};
use crate::error::Result;
use crate::types::Record;
use crate::xml::{Field, Namespace};
use roxmltree::Node;

// ============================================================================
// Contact Data
// ============================================================================

const TYPE_DATA: &[Field] = &[Field::Attribute("Primary"), Field::Reference("Type_Reference")];

const USAGE_DATA: &[Field] = &[
    Field::Attribute("Public"),
    Field::Blocks("Type_Data", TYPE_DATA),
    Field::References("Use_For_Reference"),
    Field::Text("Comments"),
];

const ADDRESS_LINE_DATA: &[Field] = &[
    Field::Content,
    Field::Attribute("Descriptor"),
    Field::Attribute("Type"),
];

const SUBREGION_DATA: &[Field] = &[
    Field::Content,
    Field::Attribute("Descriptor"),
    Field::Attribute("Type"),
];

const ADDRESS_DATA: &[Field] = &[
    Field::Attribute("Effective_Date"),
    Field::Attribute("Address_Format_Type"),
    Field::Attribute("Formatted_Address"),
    Field::Attribute("Defaulted_Business_Site_Address"),
    Field::Reference("Country_Reference"),
    Field::Text("Last_Modified"),
    Field::Blocks("Address_Line_Data", ADDRESS_LINE_DATA),
    Field::Text("Municipality"),
    Field::Blocks("Submunicipality_Data", SUBREGION_DATA),
    Field::Reference("Country_Region_Reference"),
    Field::Text("Country_Region_Descriptor"),
    Field::Blocks("Subregion_Data", SUBREGION_DATA),
    Field::Text("Postal_Code"),
    Field::Blocks("Usage_Data", USAGE_DATA),
    Field::Text("Number_of_Days"),
    Field::Reference("Address_Reference"),
    Field::Text("Address_ID"),
];

const PHONE_DATA: &[Field] = &[
    Field::Attribute("Area_Code"),
    Field::Attribute("Phone_Number_Without_Area_Code"),
    Field::Attribute("E164_Formatted_Phone"),
    Field::Attribute("Workday_Traditional_Formatted_Phone"),
    Field::Attribute("National_Formatted_Phone"),
    Field::Attribute("International_Formatted_Phone"),
    Field::Attribute("Tenant_Formatted_Phone"),
    Field::Text("International_Phone_Code"),
    Field::Text("Phone_Number"),
    Field::Text("Phone_Extension"),
    Field::Reference("Phone_Device_Type_Reference"),
    Field::Blocks("Usage_Data", USAGE_DATA),
    Field::Reference("Phone_Reference"),
    Field::Text("ID"),
];

const EMAIL_ADDRESS_DATA: &[Field] = &[
    Field::Text("Email_Address"),
    Field::Text("Email_Comment"),
    Field::Blocks("Usage_Data", USAGE_DATA),
    Field::Reference("Email_Reference"),
    Field::Text("ID"),
];

const WEB_ADDRESS_DATA: &[Field] = &[
    Field::Text("Web_Address"),
    Field::Text("Web_Address_Comment"),
    Field::Blocks("Usage_Data", USAGE_DATA),
    Field::Reference("Web_Address_Reference"),
    Field::Text("ID"),
];

const CONTACT_DATA: &[Field] = &[
    Field::Blocks("Address_Data", ADDRESS_DATA),
    Field::Blocks("Phone_Data", PHONE_DATA),
    Field::Blocks("Email_Address_Data", EMAIL_ADDRESS_DATA),
    Field::Blocks("Web_Address_Data", WEB_ADDRESS_DATA),
];

// ============================================================================
// Locations
// ============================================================================

const LOCATION_DATA: &[Field] = &[
    Field::Text("Location_ID"),
    Field::Text("Location_Name"),
    Field::Text("Inactive"),
    Field::References("Location_Usage_Reference"),
    Field::References("Location_Type_Reference"),
    Field::References("Location_Hierarchy_Reference"),
    Field::Reference("Superior_Location_Reference"),
    Field::Text("Latitude"),
    Field::Text("Longitude"),
    Field::Text("Altitude"),
    Field::Reference("Time_Profile_Reference"),
    Field::Reference("Locale_Reference"),
    Field::Reference("Display_Language_Reference"),
    Field::Reference("Time_Zone_Reference"),
    Field::Reference("Default_Currency_Reference"),
    Field::Reference("Default_Job_Posting_Location_Reference"),
    Field::Text("Trade_Name"),
    Field::Text("Worksite_ID_Code"),
    Field::Block("Contact_Data", CONTACT_DATA),
];

const LOCATION: EntityShape = EntityShape {
    element: "Location",
    reference: "Location_Reference",
    data: "Location_Data",
    fields: LOCATION_DATA,
};

pub(super) fn extract_locations(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &LOCATION)
}
