//! Job profiles and positions

use super::{extract_entities, EntityShape, ExtractContext};
use crate::error::Result;
use crate::types::Record;
use crate::xml::{Field, Namespace};
use roxmltree::Node;

// ============================================================================
// Job Profiles
// ============================================================================

const JOB_PROFILE_BASIC_DATA: &[Field] = &[
    Field::Text("Job_Title"),
    Field::Text("Inactive"),
    Field::Text("Include_Job_Code_in_Name"),
    Field::Text("Job_Profile_Private_Title"),
    Field::Text("Job_Profile_Summary"),
    Field::Text("Job_Description"),
    Field::Text("Additional_Job_Description"),
    Field::Reference("Management_Level_Reference"),
    Field::Reference("Job_Category_Reference"),
    Field::References("Job_Level_Reference"),
    Field::References("Job_Family_Reference"),
    Field::References("Company_Insider_Type_Reference"),
    Field::Text("Work_Shift_Required"),
    Field::Text("Public_Job"),
    Field::Text("Critical_Job"),
    Field::Reference("Difficulty_to_Fill_Reference"),
];

const JOB_PROFILE_EXEMPT_DATA: &[Field] = &[
    Field::Reference("Location_Context_Reference"),
    Field::Text("Job_Exempt"),
    Field::Text("Effective_Date"),
];

const JOB_PROFILE_PAY_RATE_DATA: &[Field] = &[
    Field::Reference("Country_Reference"),
    Field::Reference("Pay_Rate_Type_Reference"),
];

const JOB_CLASSIFICATION_DATA: &[Field] = &[
    Field::References("Job_Classifications_Reference"),
    Field::Text("Effective_Date"),
];

const JOB_PROFILE_DATA: &[Field] = &[
    Field::Text("Job_Code"),
    Field::Text("Effective_Date"),
    Field::Block("Job_Profile_Basic_Data", JOB_PROFILE_BASIC_DATA),
    Field::Blocks("Job_Classification_Data", JOB_CLASSIFICATION_DATA),
    Field::Blocks("Job_Profile_Pay_Rate_Data", JOB_PROFILE_PAY_RATE_DATA),
    Field::Blocks("Job_Profile_Exempt_Data", JOB_PROFILE_EXEMPT_DATA),
    Field::References("Workers_Compensation_Code_Reference"),
];

const JOB_PROFILE: EntityShape = EntityShape {
    element: "Job_Profile",
    reference: "Job_Profile_Reference",
    data: "Job_Profile_Data",
    fields: JOB_PROFILE_DATA,
};

pub(super) fn extract_job_profiles(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &JOB_PROFILE)
}

// ============================================================================
// Positions
// ============================================================================

const POSITION_DEFINITION_DATA: &[Field] = &[
    Field::Text("Position_ID"),
    Field::Text("Job_Posting_Title"),
    Field::Text("Academic_Tenure_Eligible"),
    Field::Text("Job_Description_Summary"),
    Field::Text("Job_Description"),
    Field::Reference("Position_Status_Reference"),
    Field::Text("Available_For_Hire"),
    Field::Text("Available_for_Recruiting"),
    Field::Text("Hiring_Freeze"),
    Field::Text("Work_Shift_Required"),
    Field::Text("Available_for_Overlap"),
    Field::Text("Earliest_Overlap_Date"),
    Field::Text("Critical_Job"),
    Field::Reference("Difficulty_to_Fill_Reference"),
];

const POSITION_RESTRICTIONS_DATA: &[Field] = &[
    Field::Text("Availability_Date"),
    Field::Text("Earliest_Hire_Date"),
    Field::References("Job_Family_Reference"),
    Field::References("Job_Profile_Reference"),
    Field::References("Location_Reference"),
    Field::Reference("Worker_Type_Reference"),
    Field::Reference("Time_Type_Reference"),
    Field::References("Position_Worker_Type_Reference"),
];

const POSITION_DATA: &[Field] = &[
    Field::Reference("Supervisory_Organization_Reference"),
    Field::Text("Effective_Date"),
    Field::Block("Position_Definition_Data", POSITION_DEFINITION_DATA),
    Field::Block("Position_Restrictions_Data", POSITION_RESTRICTIONS_DATA),
    Field::Reference("Worker_For_Filled_Position_Reference"),
    Field::Text("Closed"),
];

const POSITION: EntityShape = EntityShape {
    element: "Position",
    reference: "Position_Reference",
    data: "Position_Data",
    fields: POSITION_DATA,
};

pub(super) fn extract_positions(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_entities(payload, ns, &POSITION)
}
