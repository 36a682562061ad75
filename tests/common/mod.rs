#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use indexmap::IndexMap;

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Point {
        pub x: f64,
        pub y: f64,
    }
}

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Rect {
        pub p1: Point,
        pub p2: Point,
        pub color: i32,
    }
}

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct SomeOfPoints {
        pub name: String,
        pub points: Vec<Point>,
    }
}

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct StlObj {
        pub m1: Vec<i32>,
        pub m2: BTreeMap<String, Point>,
        pub m3: Vec<Point>,
        pub m4: Option<Point>,
        pub m5: Option<i32>,
        pub m6: IndexMap<String, i32>,
    }
}

config_loader::variant! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Sum {
        Point(Point),
        Int(i32),
        Text(String),
    }
}

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct TestVariant {
        #[name = "sumType"]
        pub sum_type: Sum,
    }
}

config_loader::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Tree {
        pub name: String,
        pub children: Vec<Box<Tree>>,
    }
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}
