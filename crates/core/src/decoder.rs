//! Typed, read-only access to one dynamic value
//!
//! [`ValueDecoder`] is what document implementations see when a backend row
//! is decoded into them. It never exposes the backend's native column
//! representation, only the [`Value`] model, and never coerces between
//! kinds: a `Float` reports `None` from [`ValueDecoder::as_int`].

use std::fmt;

use crate::value::Value;

/// Read-only view over a single [`Value`].
///
/// Cheap to copy. Decoding has no side effects and may be repeated any
/// number of times on the same value.
#[derive(Debug, Clone, Copy)]
pub struct ValueDecoder<'a> {
    value: &'a Value,
}

impl<'a> ValueDecoder<'a> {
    /// Wrap a value.
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// True iff the wrapped value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    /// The wrapped boolean, if the value is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The wrapped string, if the value is a `String`.
    pub fn as_string(&self) -> Option<&'a str> {
        match self.value {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The wrapped integer, if the value is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The wrapped integer reinterpreted as unsigned.
    ///
    /// Backend integer columns are signed 64-bit; the bit pattern is kept
    /// as-is with no range check, so `Int(-1)` reads as `u64::MAX`.
    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            Value::Int(i) => Some(*i as u64),
            _ => None,
        }
    }

    /// The wrapped float, if the value is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The wrapped bytes, if the value is `Bytes`.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.value {
            Value::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Number of elements, if the value is an `Array`.
    pub fn list_len(&self) -> Option<usize> {
        match self.value {
            Value::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Visit array elements in order until `f` returns false.
    ///
    /// Does nothing for non-array values. Each call walks the stored array
    /// from index 0.
    pub fn for_each_list_element<F>(&self, mut f: F)
    where
        F: FnMut(usize, ValueDecoder<'a>) -> bool,
    {
        if let Value::Array(items) = self.value {
            for (i, item) in items.iter().enumerate() {
                if !f(i, ValueDecoder::new(item)) {
                    return;
                }
            }
        }
    }

    /// Number of entries, if the value is an `Object`.
    pub fn map_len(&self) -> Option<usize> {
        match self.value {
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Visit object entries until `f` returns false.
    ///
    /// Entry order is unspecified. The third argument reports key presence
    /// and is always `true` here. Does nothing for non-object values.
    pub fn for_each_map_entry<F>(&self, mut f: F)
    where
        F: FnMut(&'a str, ValueDecoder<'a>, bool) -> bool,
    {
        if let Value::Object(map) = self.value {
            for (key, value) in map {
                if !f(key.as_str(), ValueDecoder::new(value), true) {
                    return;
                }
            }
        }
    }

    /// The wrapped value, unmodified.
    pub fn as_opaque(&self) -> &'a Value {
        self.value
    }
}

impl fmt::Display for ValueDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Which typed accessors succeed for a value, in a fixed order:
    /// null, bool, string, int, float, bytes.
    fn accessor_hits(d: &ValueDecoder<'_>) -> [bool; 6] {
        [
            d.is_null(),
            d.as_bool().is_some(),
            d.as_string().is_some(),
            d.as_int().is_some(),
            d.as_float().is_some(),
            d.as_bytes().is_some(),
        ]
    }

    fn scalar() -> impl Strategy<Value = (Value, usize)> {
        prop_oneof![
            Just((Value::Null, 0)),
            any::<bool>().prop_map(|b| (Value::Bool(b), 1)),
            ".*".prop_map(|s| (Value::String(s), 2)),
            any::<i64>().prop_map(|i| (Value::Int(i), 3)),
            any::<f64>()
                .prop_filter("NaN never equals itself", |f| !f.is_nan())
                .prop_map(|f| (Value::Float(f), 4)),
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(|b| (Value::Bytes(b), 5)),
        ]
    }

    proptest! {
        #[test]
        fn matching_accessor_returns_value_and_others_fail((value, slot) in scalar()) {
            let d = ValueDecoder::new(&value);
            let hits = accessor_hits(&d);
            for (i, hit) in hits.iter().enumerate() {
                prop_assert_eq!(*hit, i == slot);
            }
            let roundtrip = match slot {
                0 => Value::Null,
                1 => Value::Bool(d.as_bool().unwrap()),
                2 => Value::String(d.as_string().unwrap().to_string()),
                3 => Value::Int(d.as_int().unwrap()),
                4 => Value::Float(d.as_float().unwrap()),
                _ => Value::Bytes(d.as_bytes().unwrap().to_vec()),
            };
            prop_assert_eq!(roundtrip, value);
        }
    }

    #[test]
    fn test_uint_reinterprets_negative_int() {
        let v = Value::Int(-1);
        assert_eq!(ValueDecoder::new(&v).as_uint(), Some(18446744073709551615));

        let v = Value::Int(i64::MIN);
        assert_eq!(ValueDecoder::new(&v).as_uint(), Some(1u64 << 63));
    }

    #[test]
    fn test_no_numeric_coercion() {
        let f = Value::Float(2.0);
        let d = ValueDecoder::new(&f);
        assert_eq!(d.as_int(), None);
        assert_eq!(d.as_uint(), None);

        let i = Value::Int(2);
        assert_eq!(ValueDecoder::new(&i).as_float(), None);
    }

    #[test]
    fn test_list_len_only_for_arrays() {
        let arr = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(ValueDecoder::new(&arr).list_len(), Some(2));
        assert_eq!(ValueDecoder::new(&Value::from("ab")).list_len(), None);
        assert_eq!(ValueDecoder::new(&arr).map_len(), None);
    }

    #[test]
    fn test_list_traversal_stops_early_and_restarts() {
        let arr = Value::Array((0..5).map(Value::Int).collect());
        let d = ValueDecoder::new(&arr);

        let mut seen = Vec::new();
        d.for_each_list_element(|i, child| {
            seen.push((i, child.as_int().unwrap()));
            i < 1
        });
        assert_eq!(seen, vec![(0, 0), (1, 1)]);

        // The source is the stored array, not a cursor: a second walk on the
        // same decoder starts over at index 0.
        let mut again = Vec::new();
        d.for_each_list_element(|i, _| {
            again.push(i);
            true
        });
        assert_eq!(again, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_map_traversal_visits_every_entry() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::Int(1));
        map.insert("b".to_string(), Value::Int(2));
        map.insert("c".to_string(), Value::Int(3));
        let obj = Value::Object(map);
        let d = ValueDecoder::new(&obj);
        assert_eq!(d.map_len(), Some(3));

        let mut seen = Vec::new();
        d.for_each_map_entry(|k, child, present| {
            assert!(present);
            seen.push((k.to_string(), child.as_int().unwrap()));
            true
        });
        seen.sort();
        assert_eq!(
            seen,
            vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]
        );
    }

    #[test]
    fn test_map_traversal_stops_early_and_restarts() {
        let mut map = HashMap::new();
        for i in 0..4 {
            map.insert(format!("k{}", i), Value::Int(i));
        }
        let obj = Value::Object(map);
        let d = ValueDecoder::new(&obj);

        let mut count = 0;
        d.for_each_map_entry(|_, _, _| {
            count += 1;
            false
        });
        assert_eq!(count, 1);

        let mut total = 0;
        d.for_each_map_entry(|_, _, _| {
            total += 1;
            true
        });
        assert_eq!(total, 4);
    }

    #[test]
    fn test_traversal_of_wrong_kind_is_empty() {
        let v = Value::Int(3);
        let d = ValueDecoder::new(&v);
        let mut called = false;
        d.for_each_list_element(|_, _| {
            called = true;
            true
        });
        d.for_each_map_entry(|_, _, _| {
            called = true;
            true
        });
        assert!(!called);
    }

    #[test]
    fn test_as_opaque_returns_wrapped_value() {
        let v = Value::Array(vec![Value::Null]);
        assert_eq!(ValueDecoder::new(&v).as_opaque(), &v);
    }

    #[test]
    fn test_display_matches_value() {
        let v = Value::Array(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(ValueDecoder::new(&v).to_string(), "[1, \"x\"]");
    }
}
