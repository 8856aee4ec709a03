use std::fs;
use std::path::Path;

use tempfile::tempdir;
use xamldoc::{
    Argument, Direction, DocumentExtractor, WorkflowMetadata, XamldocError, parse_type_descriptor,
};

const NAMESPACES: &str = r#"xmlns="http://schemas.microsoft.com/netfx/2009/xaml/activities"
    xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
    xmlns:sap="http://schemas.microsoft.com/netfx/2009/xaml/activities/presentation"
    xmlns:sap2010="http://schemas.microsoft.com/netfx/2010/xaml/activities/presentation"
    xmlns:scg="clr-namespace:System.Collections.Generic;assembly=mscorlib"
    xmlns:sd="clr-namespace:System.Data;assembly=System.Data"
    xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
    xmlns:this="clr-namespace:""#;

fn sequence_without_arguments() -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Activity mc:Ignorable="sap sap2010" x:Class="uno" {NAMESPACES}>
  <Sequence DisplayName="uno" sap2010:Annotation.AnnotationText="Hello" sap2010:WorkflowViewState.IdRef="Sequence_1">
    <sap:WorkflowViewStateService.ViewState>
      <scg:Dictionary x:TypeArguments="x:String, x:Object">
        <x:Boolean x:Key="IsExpanded">True</x:Boolean>
      </scg:Dictionary>
    </sap:WorkflowViewStateService.ViewState>
  </Sequence>
</Activity>"#
    )
}

fn four_arguments() -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Activity mc:Ignorable="sap sap2010" x:Class="Main" this:Main.Ichi="A default string value" {NAMESPACES}>
  <x:Members>
    <x:Property Name="Ichi" Type="InArgument(x:String)" />
    <x:Property Name="Ni" Type="InArgument(x:String)" />
    <x:Property Name="San" Type="InArgument(x:String)" sap2010:Annotation.AnnotationText="Third argument" />
    <x:Property Name="Shi" Type="InArgument(sd:DataTable)" />
  </x:Members>
  <Flowchart DisplayName="Main" />
</Activity>"#
    )
}

fn extract(xml: &str) -> Result<WorkflowMetadata, XamldocError> {
    DocumentExtractor::new().extract_str(xml, Path::new("fixture.xaml"))
}

#[test]
fn sequence_root_without_arguments() {
    let metadata = extract(&sequence_without_arguments()).unwrap();
    assert_eq!(metadata.name().unwrap(), "uno");
    assert_eq!(metadata.description().unwrap(), "Hello");
    assert_eq!(metadata.arguments().len(), 0);
}

#[test]
fn four_arguments_with_single_default() {
    let metadata = extract(&four_arguments()).unwrap();
    assert_eq!(metadata.arguments().len(), 4);

    let directions: Vec<_> = metadata.arguments().iter().map(Argument::direction).collect();
    assert_eq!(directions, vec![Direction::In; 4]);

    let types: Vec<_> = metadata.arguments().iter().map(Argument::type_name).collect();
    assert_eq!(types, vec!["String", "String", "String", "DataTable"]);

    assert_eq!(
        metadata.argument("Ichi").unwrap().default_value(),
        "A default string value"
    );
    assert_eq!(metadata.argument("Ni").unwrap().default_value(), "");
    assert_eq!(
        metadata.argument("San").unwrap().annotation(),
        "Third argument"
    );
}

#[test]
fn in_out_token_normalizes_to_in_out_direction() {
    let descriptor = parse_type_descriptor("InOutArgument(x:String)").unwrap();
    assert_eq!(descriptor.direction, "InOutArgument");
    assert_eq!(descriptor.type_name, "String");

    let argument = Argument::new(
        "Go",
        &descriptor.direction,
        descriptor.type_name,
        "",
        "",
    )
    .unwrap();
    assert_eq!(argument.direction(), Direction::InOut);
    assert_eq!(argument.type_name(), "String");
}

#[test]
fn document_without_known_root_is_malformed() {
    let xml = format!(
        r#"<Activity x:Class="Main" {NAMESPACES}><StateMachine DisplayName="Main" /></Activity>"#
    );
    let err = extract(&xml).unwrap_err();
    assert!(matches!(err, XamldocError::MalformedDocument { .. }));
    assert!(err.is_malformed_document());
}

#[test]
fn root_without_annotation_has_empty_description() {
    let xml = format!(
        r#"<Activity x:Class="Main" {NAMESPACES}><Sequence DisplayName="Main" /></Activity>"#
    );
    let metadata = extract(&xml).unwrap();
    assert_eq!(metadata.description().unwrap(), "");
}

#[test]
fn extraction_is_idempotent() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Main.xaml");
    fs::write(&path, four_arguments()).unwrap();

    let extractor = DocumentExtractor::new();
    let first = extractor.extract_file(&path).unwrap();
    let second = extractor.extract_file(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.source_path(), path.as_path());
}

#[test]
fn missing_file_propagates_io_error() {
    let temp = tempdir().unwrap();
    let err = DocumentExtractor::new()
        .extract_file(&temp.path().join("absent.xaml"))
        .unwrap_err();
    assert!(matches!(err, XamldocError::Io(_)));
}

#[test]
fn metadata_serializes_arguments_in_declaration_order() {
    let metadata = extract(&four_arguments()).unwrap();
    let json = serde_json::to_value(&metadata).unwrap();
    let names: Vec<_> = json["arguments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|arg| arg["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ichi", "Ni", "San", "Shi"]);
    assert_eq!(json["arguments"][3]["type"], "DataTable");
}
