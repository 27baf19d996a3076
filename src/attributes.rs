//! Typed entity attributes
//!
//! The external model sends attributes as `(name, type, value)` text
//! triples. They are converted once at the boundary into the closed
//! [`NodeAttribute`] / [`LinkAttribute`] enums; unknown names, mismatched
//! types and unparsable values convert to `None` and are ignored.
//!
//! Names may carry the `space:` namespace prefix (`space:color`) or not
//! (`color`). `particles:position` is accepted as an alias for `position`.

use std::fmt;

use glam::{Vec3, Vec4};
use serde::Serialize;

/// Declared type of a textual attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Bool,
    Int,
    Float,
    Vec3,
    Vec4,
    String,
}

/// Typed value wrapper returned by attribute queries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Variable {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    String(String),
}

impl Variable {
    /// Parse `value` as the given type
    pub fn parse(kind: VariableType, value: &str) -> Option<Self> {
        let value = value.trim();
        match kind {
            VariableType::Bool => parse_bool(value).map(Variable::Bool),
            VariableType::Int => value.parse().ok().map(Variable::Int),
            VariableType::Float => value.parse().ok().map(Variable::Float),
            VariableType::Vec3 => parse_floats::<3>(value).map(|v| Variable::Vec3(Vec3::from_array(v))),
            VariableType::Vec4 => parse_floats::<4>(value).map(|v| Variable::Vec4(Vec4::from_array(v))),
            VariableType::String => Some(Variable::String(value.to_string())),
        }
    }

    pub fn kind(&self) -> VariableType {
        match self {
            Variable::Bool(_) => VariableType::Bool,
            Variable::Int(_) => VariableType::Int,
            Variable::Float(_) => VariableType::Float,
            Variable::Vec3(_) => VariableType::Vec3,
            Variable::Vec4(_) => VariableType::Vec4,
            Variable::String(_) => VariableType::String,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Bool(v) => write!(f, "{v}"),
            Variable::Int(v) => write!(f, "{v}"),
            Variable::Float(v) => write!(f, "{v}"),
            Variable::Vec3(v) => write!(f, "{} {} {}", v.x, v.y, v.z),
            Variable::Vec4(v) => write!(f, "{} {} {} {}", v.x, v.y, v.z, v.w),
            Variable::String(v) => f.write_str(v),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Whitespace- or comma-separated components
fn parse_floats<const N: usize>(value: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    for slot in &mut out {
        *slot = parts.next()?.parse().ok()?;
    }
    parts.next().is_none().then_some(out)
}

pub(crate) fn strip_namespace(name: &str) -> &str {
    name.strip_prefix("space:").unwrap_or(name)
}

/// Color given as vec3 (opaque) or vec4
fn color(kind: VariableType, value: &str) -> Option<Vec4> {
    match Variable::parse(kind, value)? {
        Variable::Vec3(c) => Some(c.extend(1.0)),
        Variable::Vec4(c) => Some(c),
        _ => None,
    }
}

fn float(kind: VariableType, value: &str) -> Option<f32> {
    match (kind, Variable::parse(kind, value)?) {
        (VariableType::Float, Variable::Float(v)) => Some(v),
        _ => None,
    }
}

fn string(kind: VariableType, value: &str) -> Option<String> {
    match (kind, Variable::parse(kind, value)?) {
        (VariableType::String, Variable::String(v)) => Some(v),
        _ => None,
    }
}

/// Attribute settable on a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttribute {
    Locked(bool),
    Position(Vec3),
    Color(Vec4),
    Lod(f32),
    Activity(f32),
    Icon(String),
    Mark(i32),
    Size(f32),
}

impl NodeAttribute {
    /// Convert a textual triple, `None` for unsupported name/type pairs
    pub fn parse(name: &str, kind: VariableType, value: &str) -> Option<Self> {
        if name == "particles:position" {
            return Self::parse("position", kind, value);
        }
        match (strip_namespace(name), kind) {
            ("locked", VariableType::Bool) => parse_bool(value.trim()).map(Self::Locked),
            ("position", VariableType::Vec3) => {
                parse_floats::<3>(value.trim()).map(|v| Self::Position(Vec3::from_array(v)))
            }
            ("color", VariableType::Vec3 | VariableType::Vec4) => color(kind, value).map(Self::Color),
            ("lod", _) => float(kind, value).map(Self::Lod),
            ("activity", _) => float(kind, value).map(Self::Activity),
            ("icon", _) => string(kind, value).map(Self::Icon),
            ("mark", VariableType::Int) => value.trim().parse().ok().map(Self::Mark),
            ("size", _) => float(kind, value).map(Self::Size),
            _ => None,
        }
    }
}

/// Attribute settable on a link
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAttribute {
    /// Both endpoint colors
    Color(Vec4),
    Color1(Vec4),
    Color2(Vec4),
    Width(f32),
    Activity(f32),
    Lod(f32),
    Icon(String),
}

impl LinkAttribute {
    /// Convert a textual triple, `None` for unsupported name/type pairs
    pub fn parse(name: &str, kind: VariableType, value: &str) -> Option<Self> {
        match (strip_namespace(name), kind) {
            ("color", VariableType::Vec3 | VariableType::Vec4) => color(kind, value).map(Self::Color),
            ("color1", VariableType::Vec3 | VariableType::Vec4) => color(kind, value).map(Self::Color1),
            ("color2", VariableType::Vec3 | VariableType::Vec4) => color(kind, value).map(Self::Color2),
            ("width", _) => float(kind, value).map(Self::Width),
            ("activity", _) => float(kind, value).map(Self::Activity),
            ("lod", _) => float(kind, value).map(Self::Lod),
            ("icon", _) => string(kind, value).map(Self::Icon),
            _ => None,
        }
    }
}
