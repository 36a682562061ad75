#![cfg(feature = "xml")]

mod common;

use common::*;
use config_loader::{Loader, Status, Xml, load_from_source, load_from_text};
use pretty_assertions::assert_eq;

#[test]
fn flat_point() {
    let mut point = Point::default();
    let result = Loader::new(Xml).load_file(&mut point, fixture("point.xml"));
    assert_eq!(Status::of(&result), Status::Success);
    assert_eq!(point, Point { x: 1.2, y: 3.4 });
}

#[test]
fn nested_rect_with_hex_color() {
    let mut rect = Rect::default();
    Loader::new(Xml).load_file(&mut rect, fixture("rect.xml")).unwrap();
    assert_eq!(
        rect,
        Rect {
            p1: Point { x: 1.2, y: 3.4 },
            p2: Point { x: 5.6, y: 7.8 },
            color: 0x12345678,
        }
    );
}

#[test]
fn rect_without_corners_is_missing_field() {
    let mut rect = Rect::default();
    let result = load_from_source(Xml, &mut rect, || {
        Ok::<_, std::io::Error>(
            r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <rect>
                    <color>0x12345678</color>
                </rect>
            "#
            .to_owned(),
        )
    });
    assert_eq!(Status::of(&result), Status::ErrMissingField);
}

#[test]
fn sequence_of_records() {
    let mut some = SomeOfPoints::default();
    Loader::new(Xml).load_file(&mut some, fixture("some_of_points.xml")).unwrap();
    assert_eq!(some.name, "Some of points");
    assert_eq!(
        some.points,
        [
            Point { x: 1.2, y: 3.4 },
            Point { x: 5.6, y: 7.8 },
            Point { x: 2.2, y: 3.3 },
        ]
    );
}

#[test]
fn compound_containers() {
    let mut data = StlObj::default();
    Loader::new(Xml).load_file(&mut data, fixture("stl_obj.xml")).unwrap();
    assert_eq!(data.m1, [2, 4, 6]);
    assert_eq!(data.m2.len(), 1);
    assert_eq!(data.m2["hello world"], Point { x: 1.2, y: 3.4 });
    assert!(data.m3.is_empty());
    assert_eq!(data.m4, Some(Point { x: 5.6, y: 7.8 }));
    assert_eq!(data.m5, None);
    assert!(data.m6.is_empty());
}

config_loader::record! {
    #[derive(Debug, Default)]
    struct Counts {
        by_name: indexmap::IndexMap<String, i32>,
    }
}

#[test]
fn duplicate_map_keys_keep_the_last_value() {
    let mut counts = Counts::default();
    let content = r#"
        <Counts>
            <by_name>
                <value key="a">1</value>
                <value key="b">5</value>
                <value key="a">2</value>
            </by_name>
        </Counts>
    "#;
    load_from_text(Xml, &mut counts, content).unwrap();
    assert_eq!(counts.by_name.len(), 2);
    assert_eq!(counts.by_name["a"], 2);
    assert_eq!(counts.by_name["b"], 5);
}

#[test]
fn map_entry_without_a_key_is_missing_field() {
    let mut counts = Counts::default();
    let content = "<Counts><by_name><value key=\"a\">1</value><value>2</value></by_name></Counts>";
    let result = load_from_text(Xml, &mut counts, content);
    assert_eq!(Status::of(&result), Status::ErrMissingField);
    let path = result.unwrap_err().path().map(ToString::to_string);
    assert_eq!(path.as_deref(), Some("by_name[1]"));
}

config_loader::record! {
    #[derive(Debug, Default)]
    struct TestBool {
        m1: bool,
    }
}

#[test]
fn bool_spellings() {
    let spellings = [("true", true), ("True", true), ("1", true), ("false", false), ("FALSE", false)];
    for (text, expected) in spellings {
        let mut obj = TestBool::default();
        let content = format!("<TestBool><m1>{text}</m1></TestBool>");
        assert_eq!(Status::of(&load_from_text(Xml, &mut obj, &content)), Status::Success, "{text}");
        assert_eq!(obj.m1, expected, "{text}");
    }

    let mut obj = TestBool::default();
    let result = load_from_text(Xml, &mut obj, "<TestBool><m1>unknown</m1></TestBool>");
    assert_eq!(Status::of(&result), Status::ErrExtractingField);
}

config_loader::record! {
    #[derive(Debug, Default)]
    struct TestInt8 {
        m1: u8,
        m2: i8,
    }
}

#[test]
fn eight_bit_integers_are_numbers_not_characters() {
    let mut obj = TestInt8::default();
    load_from_text(Xml, &mut obj, "<TestInt8><m1>48</m1><m2>0</m2></TestInt8>").unwrap();
    assert_eq!(obj.m1, 48);
    assert_eq!(obj.m2, 0);

    let result = load_from_text(Xml, &mut obj, "<TestInt8><m1>256</m1><m2>0</m2></TestInt8>");
    assert_eq!(Status::of(&result), Status::ErrExtractingField);
}

config_loader::record! {
    #[derive(Debug, Default)]
    struct TestInt {
        number: i32,
    }
}

#[test]
fn hex_numbers() {
    for text in ["0X12", "0x12"] {
        let mut obj = TestInt::default();
        let content = format!("<TestInt><number>{text}</number></TestInt>");
        load_from_text(Xml, &mut obj, &content).unwrap();
        assert_eq!(obj.number, 0x12);
    }
    let mut obj = TestInt::default();
    let result = load_from_text(Xml, &mut obj, "<TestInt><number>0x</number></TestInt>");
    assert_eq!(Status::of(&result), Status::ErrExtractingField);
}

fn load_variant(content: &str) -> (Result<(), config_loader::Error>, TestVariant) {
    let mut obj = TestVariant::default();
    let result = load_from_text(Xml, &mut obj, content);
    (result, obj)
}

#[test]
fn variant_selects_by_content() {
    let (result, obj) = load_variant("<TestVariant><sumType>hello world!</sumType></TestVariant>");
    result.unwrap();
    assert_eq!(obj.sum_type.index(), 2);
    assert_eq!(obj.sum_type, Sum::Text("hello world!".into()));

    let (result, obj) = load_variant("<TestVariant>\n  <sumType>987654</sumType>\n</TestVariant>");
    result.unwrap();
    assert_eq!(obj.sum_type, Sum::Int(987654));

    let (result, obj) = load_variant(
        r#"
            <TestVariant>
                <sumType>
                    <x>1.2</x><y>3.4</y>
                </sumType>
            </TestVariant>
        "#,
    );
    result.unwrap();
    assert_eq!(obj.sum_type.index(), 0);
    assert_eq!(obj.sum_type, Sum::Point(Point { x: 1.2, y: 3.4 }));
}

#[test]
fn variant_failures() {
    let (result, _) = load_variant("<TestVariant>\n</TestVariant>");
    assert_eq!(Status::of(&result), Status::ErrMissingField);

    let (result, _) = load_variant("<TestVariant><sumType><x>1.2</x></sumType></TestVariant>");
    assert_eq!(Status::of(&result), Status::ErrType);

    let (result, _) = load_variant("<TestVariant><sumType>\n   </sumType></TestVariant>");
    assert_eq!(Status::of(&result), Status::ErrType);
}

#[test]
fn recursive_tree() {
    let mut tree = Tree::default();
    Loader::new(Xml).load_file(&mut tree, fixture("tree.xml")).unwrap();
    assert_eq!(tree.name, "hello");
    let names: Vec<_> = tree.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(names, ["world", "first", "second"]);
    assert_eq!(tree.children[2].children.len(), 1);
    assert_eq!(tree.children[2].children[0].name, "leaf");
    assert!(tree.children[0].children.is_empty());
}
