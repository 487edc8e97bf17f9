//! Walks a `Serialize` value and rejects NaN and infinite floats.
//!
//! serde_json quietly writes non-finite floats as `null`, which would change
//! the value on the far side. Running this probe first turns that into an
//! encoding error that names where the float sits, e.g. `$.readings[2]`.

use std::fmt;

use serde::ser::{self, Serialize};

#[derive(Debug)]
pub(crate) struct NonFinite(String);

impl fmt::Display for NonFinite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for NonFinite {}

impl ser::Error for NonFinite {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        NonFinite(msg.to_string())
    }
}

pub(crate) fn check<T: Serialize + ?Sized>(value: &T) -> Result<(), NonFinite> {
    let mut path = Vec::new();
    value.serialize(Probe { path: &mut path })
}

fn render(path: &[String]) -> String {
    let mut out = String::from("$");
    for segment in path {
        out.push_str(segment);
    }
    out
}

fn key_label<K: Serialize + ?Sized>(key: &K) -> String {
    match serde_json::to_value(key) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

struct Probe<'a> {
    path: &'a mut Vec<String>,
}

impl Probe<'_> {
    fn check(self, value: f64) -> Result<(), NonFinite> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(NonFinite(format!(
                "non-finite float {} at {}",
                value,
                render(self.path)
            )))
        }
    }
}

macro_rules! accept {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, _value: $ty) -> Result<(), NonFinite> {
                Ok(())
            }
        )*
    };
}

impl<'a> ser::Serializer for Probe<'a> {
    type Ok = ();
    type Error = NonFinite;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    accept!(
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_char: char,
        serialize_str: &str,
        serialize_bytes: &[u8],
    );

    fn serialize_f32(self, value: f32) -> Result<(), NonFinite> {
        self.check(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> Result<(), NonFinite> {
        self.check(value)
    }

    fn serialize_none(self) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), NonFinite> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), NonFinite> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        self.path.push(format!(".{variant}"));
        value.serialize(Probe {
            path: &mut *self.path,
        })?;
        self.path.pop();
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::new(self.path))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::new(self.path))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::new(self.path))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::variant(self.path, variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::new(self.path))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::new(self.path))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, NonFinite> {
        Ok(Compound::variant(self.path, variant))
    }
}

struct Compound<'a> {
    path: &'a mut Vec<String>,
    index: usize,
    key: Option<String>,
    variant: bool,
}

impl<'a> Compound<'a> {
    fn new(path: &'a mut Vec<String>) -> Self {
        Self {
            path,
            index: 0,
            key: None,
            variant: false,
        }
    }

    fn variant(path: &'a mut Vec<String>, variant: &'static str) -> Self {
        path.push(format!(".{variant}"));
        Self {
            path,
            index: 0,
            key: None,
            variant: true,
        }
    }

    fn visit<T: ?Sized + Serialize>(&mut self, segment: String, value: &T) -> Result<(), NonFinite> {
        self.path.push(segment);
        value.serialize(Probe {
            path: &mut *self.path,
        })?;
        self.path.pop();
        Ok(())
    }

    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        let segment = format!("[{}]", self.index);
        self.index += 1;
        self.visit(segment, value)
    }

    fn finish(self) -> Result<(), NonFinite> {
        if self.variant {
            self.path.pop();
        }
        Ok(())
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        self.element(value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        self.element(value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        self.element(value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        self.element(value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), NonFinite> {
        let label = key_label(key);
        self.visit(format!("[{label:?}]"), key)?;
        self.key = Some(label);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), NonFinite> {
        let label = self.key.take().unwrap_or_else(|| "?".to_string());
        self.visit(format!(".{label}"), value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        self.visit(format!(".{key}"), value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = NonFinite;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), NonFinite> {
        self.visit(format!(".{key}"), value)
    }

    fn end(self) -> Result<(), NonFinite> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Reading {
        sensor: String,
        values: Vec<f64>,
    }

    #[derive(Serialize)]
    enum Shape {
        Circle { radius: f32 },
    }

    #[test]
    fn finite_values_pass() {
        let reading = Reading {
            sensor: "a".into(),
            values: vec![1.0, -2.5, 0.0],
        };
        assert!(check(&reading).is_ok());
        assert!(check(&Some(3.0f32)).is_ok());
    }

    #[test]
    fn reports_path_of_nan_in_sequence() {
        let reading = Reading {
            sensor: "a".into(),
            values: vec![1.0, 2.0, f64::NAN],
        };
        let err = check(&reading).unwrap_err();
        assert_eq!(err.to_string(), "non-finite float NaN at $.values[2]");
    }

    #[test]
    fn reports_map_keys() {
        let mut body = BTreeMap::new();
        body.insert("bad".to_string(), f64::INFINITY);
        let err = check(&body).unwrap_err();
        assert_eq!(err.to_string(), "non-finite float inf at $.bad");
    }

    #[test]
    fn reports_struct_variants() {
        let err = check(&Shape::Circle {
            radius: f32::NEG_INFINITY,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "non-finite float -inf at $.Circle.radius");
    }
}
