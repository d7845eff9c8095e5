use super::*;
use crate::error::Error;
use crate::types::JsonValue;
use pretty_assertions::assert_eq;
use roxmltree::Document;
use serde_json::json;

const WD: &str = "urn:com.workday/bsvc";

const LOCATION: &str = r#"<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <wd:Get_Locations_Response xmlns:wd="urn:com.workday/bsvc">
      <wd:Response_Data>
        <wd:Location>
          <wd:Location_Reference wd:Descriptor="Headquarters">
            <wd:ID wd:type="WID">abc123</wd:ID>
            <wd:ID wd:type="Location_ID">LOC-1</wd:ID>
            <wd:ID></wd:ID>
          </wd:Location_Reference>
          <wd:Location_Data>
            <wd:Location_Name>Headquarters</wd:Location_Name>
            <wd:Inactive>0</wd:Inactive>
            <wd:Address_Line_Data wd:Type="ADDRESS_LINE_1" wd:Descriptor="Address Line 1">1 Main St</wd:Address_Line_Data>
            <wd:Address_Line_Data wd:Type="ADDRESS_LINE_2">Suite 2</wd:Address_Line_Data>
            <wd:Location_Usage_Reference>
              <wd:ID wd:type="Location_Usage_ID">BUSINESS SITE</wd:ID>
            </wd:Location_Usage_Reference>
          </wd:Location_Data>
        </wd:Location>
      </wd:Response_Data>
    </wd:Get_Locations_Response>
  </env:Body>
</env:Envelope>"#;

fn location<'a, 'i>(doc: &'a Document<'i>) -> (Namespace, roxmltree::Node<'a, 'i>) {
    let ns = discover_namespace(doc.root_element()).unwrap();
    let node = find_descendant(doc.root_element(), "Location", &ns).unwrap();
    (ns, node)
}

// ============================================================================
// Namespace discovery
// ============================================================================

#[test]
fn test_discover_namespace_ignores_envelope() {
    let doc = Document::parse(LOCATION).unwrap();
    let ns = discover_namespace(doc.root_element()).unwrap();
    assert_eq!(ns.uri(), Some(WD));
    assert_eq!(ns.prefix(), "wd");
}

#[test]
fn test_discover_namespace_unqualified_document() {
    let doc = Document::parse("<Report><Row>1</Row></Report>").unwrap();
    let ns = discover_namespace(doc.root_element()).unwrap();
    assert_eq!(ns, Namespace::unqualified());
    assert_eq!(find_text(Some(doc.root_element()), "Row", &ns), Some("1".into()));
}

#[test]
fn test_discover_namespace_rejects_two_vendor_namespaces() {
    let xml = r#"<a:Root xmlns:a="urn:one" xmlns:b="urn:two"><b:Child/></a:Root>"#;
    let doc = Document::parse(xml).unwrap();
    match discover_namespace(doc.root_element()) {
        Err(Error::AmbiguousNamespace { namespaces }) => {
            assert_eq!(namespaces, vec!["urn:one".to_string(), "urn:two".to_string()]);
        }
        other => panic!("expected ambiguous namespace, got {other:?}"),
    }
}

// ============================================================================
// Lookups
// ============================================================================

#[test]
fn test_find_text_null_safety() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);

    assert_eq!(
        find_text(Some(loc), "Location_Data/Location_Name", &ns),
        Some("Headquarters".into())
    );
    assert_eq!(
        find_text(Some(loc), "wd:Location_Data/wd:Inactive", &ns),
        Some("0".into())
    );
    assert_eq!(find_text(Some(loc), "Location_Data/Missing", &ns), None);
    assert_eq!(find_text(None, "Location_Data", &ns), None);
}

#[test]
fn test_find_text_wrong_namespace_does_not_match() {
    let doc = Document::parse(LOCATION).unwrap();
    let (_, loc) = location(&doc);
    let other = Namespace::new("urn:other");
    assert_eq!(find_text(Some(loc), "Location_Data/Location_Name", &other), None);
}

#[test]
fn test_get_attribute() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);
    let reference = find(Some(loc), "Location_Reference", &ns);

    assert_eq!(
        get_attribute(reference, "Descriptor", &ns),
        Some("Headquarters".into())
    );
    assert_eq!(get_attribute(reference, "Missing", &ns), None);
    assert_eq!(get_attribute(None, "Descriptor", &ns), None);
}

#[test]
fn test_find_all_returns_empty_for_absent_parent() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);

    assert_eq!(find_all(Some(loc), "Location_Data/Address_Line_Data", &ns).len(), 2);
    assert!(find_all(Some(loc), "Missing/Address_Line_Data", &ns).is_empty());
    assert!(find_all(None, "Location_Data", &ns).is_empty());
}

// ============================================================================
// Reference blocks
// ============================================================================

#[test]
fn test_find_all_ids_uses_sentinels() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);
    let ids = find_all_ids(find(Some(loc), "Location_Reference", &ns), &ns);

    assert_eq!(
        JsonValue::Array(ids),
        json!([
            {"#content": "abc123", "-type": "WID"},
            {"#content": "LOC-1", "-type": "Location_ID"},
            {"#content": "Unknown ID", "-type": "Unknown Type"}
        ])
    );
    assert!(find_all_ids(None, &ns).is_empty());
}

#[test]
fn test_reference_block_shape() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);

    let usage = reference_block(find(Some(loc), "Location_Data/Location_Usage_Reference", &ns), &ns);
    assert_eq!(
        usage,
        json!({"ID": [{"#content": "BUSINESS SITE", "-type": "Location_Usage_ID"}]})
    );

    let with_descriptor = reference_block(find(Some(loc), "Location_Reference", &ns), &ns);
    assert_eq!(with_descriptor["-Descriptor"], json!("Headquarters"));

    assert_eq!(reference_block(None, &ns), JsonValue::Null);
}

// ============================================================================
// Field lists
// ============================================================================

const ADDRESS_LINE: &[Field] = &[
    Field::Content,
    Field::Attribute("Descriptor"),
    Field::Attribute("Type"),
];

const LOCATION_DATA: &[Field] = &[
    Field::Text("Location_Name"),
    Field::Text("Inactive"),
    Field::Text("Time_Profile"),
    Field::Blocks("Address_Line_Data", ADDRESS_LINE),
    Field::References("Location_Usage_Reference"),
    Field::Reference("Superior_Location_Reference"),
    Field::Block("Contact_Data", &[Field::Text("Email")]),
];

#[test]
fn test_data_block_from_field_list() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);

    let block = data_block(find(Some(loc), "Location_Data", &ns), LOCATION_DATA, &ns);
    assert_eq!(
        block,
        json!({
            "Location_Name": "Headquarters",
            "Inactive": "0",
            "Time_Profile": null,
            "Address_Line_Data": [
                {"#content": "1 Main St", "-Descriptor": "Address Line 1", "-Type": "ADDRESS_LINE_1"},
                {"#content": "Suite 2", "-Descriptor": null, "-Type": "ADDRESS_LINE_2"}
            ],
            "Location_Usage_Reference": [
                {"ID": [{"#content": "BUSINESS SITE", "-type": "Location_Usage_ID"}]}
            ],
            "Superior_Location_Reference": null,
            "Contact_Data": null
        })
    );
}

#[test]
fn test_data_block_absent_node_is_null() {
    let ns = Namespace::new(WD);
    assert_eq!(data_block(None, LOCATION_DATA, &ns), JsonValue::Null);
}

#[test]
fn test_field_keys_use_last_segment() {
    assert_eq!(Field::Text("Worker_Data/Worker_ID").key(), "Worker_ID");
    assert_eq!(Field::Attribute("Primary").key(), "-Primary");
    assert_eq!(Field::Content.key(), "#content");
    assert_eq!(Field::Reference("wd:Job_Family_Reference").key(), "Job_Family_Reference");
}

// ============================================================================
// Full-tree conversion
// ============================================================================

#[test]
fn test_to_value_conventions() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);
    let value = to_value(find(Some(loc), "Location_Data", &ns).unwrap());

    assert_eq!(value["Location_Name"], json!("Headquarters"));
    assert_eq!(
        value["Address_Line_Data"],
        json!([
            {"-Type": "ADDRESS_LINE_1", "-Descriptor": "Address Line 1", "#content": "1 Main St"},
            {"-Type": "ADDRESS_LINE_2", "#content": "Suite 2"}
        ])
    );
    assert_eq!(
        value["Location_Usage_Reference"],
        json!({"ID": [{"-type": "Location_Usage_ID", "#content": "BUSINESS SITE"}]})
    );
}

#[test]
fn test_to_value_ids_are_always_lists_with_sentinels() {
    let doc = Document::parse(LOCATION).unwrap();
    let (ns, loc) = location(&doc);
    let value = to_value(find(Some(loc), "Location_Reference", &ns).unwrap());

    assert_eq!(
        value,
        json!({
            "-Descriptor": "Headquarters",
            "ID": [
                {"-type": "WID", "#content": "abc123"},
                {"-type": "Location_ID", "#content": "LOC-1"},
                {"-type": "Unknown Type", "#content": "Unknown ID"}
            ]
        })
    );
}

#[test]
fn test_to_value_empty_leaf_is_null() {
    let doc = Document::parse("<a><b/><c>  </c><d>x</d></a>").unwrap();
    assert_eq!(
        to_value(doc.root_element()),
        json!({"b": null, "c": null, "d": "x"})
    );
}
