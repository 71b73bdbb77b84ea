//! Muxers: decode, resolve, translate and re-emit in one call
//!
//! A muxer is built around a target schema and an [`Endec`]. Whatever version
//! an input actually conforms to, the output is always at the target version:
//!
//! ```text
//! bytes -> decode -> resolve version -> translate to target -> bind type? -> encode/return
//! ```
//!
//! The first failing stage aborts the call with that stage's error.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::convergent::{Assignee, TypedSchema};
use crate::endec::Endec;
use crate::error::Result;
use crate::lacuna::TranslationLacunas;
use crate::schema::{Instance, Schema};

/// A muxer as a single boxed callable
pub type MuxFn<O> = Box<dyn Fn(&[u8]) -> Result<(O, TranslationLacunas)> + Send + Sync>;

/// A decode-resolve-translate pipeline
pub trait Mux: Send + Sync + 'static {
    type Output;

    fn mux(&self, input: &[u8]) -> Result<(Self::Output, TranslationLacunas)>;

    fn into_fn(self) -> MuxFn<Self::Output>
    where
        Self: Sized,
    {
        Box::new(move |input: &[u8]| self.mux(input))
    }
}

/// Decode input and bring it to the target version
fn converge(
    target: &Schema,
    endec: &dyn Endec,
    input: &[u8],
) -> Result<(Instance, TranslationLacunas)> {
    let value = endec.decode(input)?;
    debug!(endec = endec.name(), target = %target, "Decoded input");

    let resolved = target.lineage().search_and_validate(&value)?;
    debug!(target = %target, resolved = %resolved.version(), "Resolved input version");

    let (instance, lacunas) = Instance::validated(resolved, value).translate(target.version())?;
    debug!(target = %target, lacunas = lacunas.len(), "Translated input to target version");
    Ok((instance, lacunas))
}

/// Yields an [`Instance`] at the target version
#[derive(Clone)]
pub struct UntypedMux {
    target: Schema,
    endec: Arc<dyn Endec>,
}

pub fn new_untyped_mux<E: Endec + 'static>(target: &Schema, endec: E) -> UntypedMux {
    UntypedMux {
        target: target.clone(),
        endec: Arc::new(endec),
    }
}

impl UntypedMux {
    pub fn target(&self) -> &Schema {
        &self.target
    }
}

impl Mux for UntypedMux {
    type Output = Instance;

    fn mux(&self, input: &[u8]) -> Result<(Instance, TranslationLacunas)> {
        converge(&self.target, self.endec.as_ref(), input)
    }
}

/// Yields bytes, re-encoded at the target version
#[derive(Clone)]
pub struct ByteMux {
    target: Schema,
    endec: Arc<dyn Endec>,
}

pub fn new_byte_mux<E: Endec + 'static>(target: &Schema, endec: E) -> ByteMux {
    ByteMux {
        target: target.clone(),
        endec: Arc::new(endec),
    }
}

impl ByteMux {
    pub fn target(&self) -> &Schema {
        &self.target
    }
}

impl Mux for ByteMux {
    type Output = Vec<u8>;

    fn mux(&self, input: &[u8]) -> Result<(Vec<u8>, TranslationLacunas)> {
        let (instance, lacunas) = converge(&self.target, self.endec.as_ref(), input)?;
        let bytes = self.endec.encode(instance.value())?;
        debug!(endec = self.endec.name(), bytes = bytes.len(), "Encoded output");
        Ok((bytes, lacunas))
    }
}

/// Yields the bound type `T`
pub struct TypedMux<T> {
    target: TypedSchema<T>,
    endec: Arc<dyn Endec>,
}

impl<T> Clone for TypedMux<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            endec: Arc::clone(&self.endec),
        }
    }
}

pub fn new_typed_mux<T: Assignee, E: Endec + 'static>(
    target: &TypedSchema<T>,
    endec: E,
) -> TypedMux<T> {
    TypedMux {
        target: target.clone(),
        endec: Arc::new(endec),
    }
}

impl<T: Assignee> TypedMux<T> {
    fn typed(&self, input: &[u8]) -> Result<(T, TranslationLacunas)> {
        let (instance, lacunas) = converge(self.target.schema(), self.endec.as_ref(), input)?;
        let typed = self.target.convert(instance.value())?;
        debug!(ty = self.target.type_name(), "Bound output to type");
        Ok((typed, lacunas))
    }
}

impl<T: Assignee> Mux for TypedMux<T> {
    type Output = T;

    fn mux(&self, input: &[u8]) -> Result<(T, TranslationLacunas)> {
        self.typed(input)
    }
}

/// Yields the map form of the bound type `T`
///
/// The map comes from serializing `T`, so it carries exactly the fields `T`
/// does, even where the schema is looser.
pub struct ValueMux<T> {
    inner: TypedMux<T>,
}

impl<T> Clone for ValueMux<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub fn new_value_mux<T: Assignee, E: Endec + 'static>(
    target: &TypedSchema<T>,
    endec: E,
) -> ValueMux<T> {
    ValueMux {
        inner: new_typed_mux(target, endec),
    }
}

impl<T: Assignee> Mux for ValueMux<T> {
    type Output = Map<String, Value>;

    fn mux(&self, input: &[u8]) -> Result<(Map<String, Value>, TranslationLacunas)> {
        let (typed, lacunas) = self.inner.typed(input)?;
        Ok((self.inner.target.to_map(&typed)?, lacunas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergent::ConvergentLineage;
    use crate::endec::JsonEndec;
    use crate::error::LineageError;
    use crate::lineage::{Lineage, LineageOptions};
    use crate::version::sv;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    fn expand() -> Lineage {
        crate::exemplars::expand(LineageOptions::default()).unwrap()
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Expanded {
        init: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        optional: Option<i64>,
        with_default: String,
    }

    #[test]
    fn test_untyped_mux_converges_on_target() {
        let lineage = expand();
        let mux = new_untyped_mux(&lineage.latest(), JsonEndec::new("test"));
        let (instance, lacunas) = mux.mux(br#"{"init": "a"}"#).unwrap();
        assert_eq!(instance.version(), sv(1, 0));
        assert_eq!(instance.value(), &json!({"init": "a", "withDefault": "foo"}));
        assert_eq!(lacunas.len(), 1);
    }

    #[test]
    fn test_stage_errors_pass_through() {
        let mux = new_untyped_mux(&expand().latest(), JsonEndec::new("broken"));
        assert!(matches!(mux.mux(b"{"), Err(LineageError::Decode { .. })));
        assert!(matches!(
            mux.mux(br#"{"init": 1}"#),
            Err(LineageError::Resolution(_))
        ));
    }

    #[test]
    fn test_typed_and_value_mux() {
        let convergent = ConvergentLineage::<Expanded>::bind(&expand(), sv(1, 0)).unwrap();

        let typed = convergent.typed_mux(JsonEndec::new("test")).into_fn();
        let (value, _) = typed(br#"{"init": "a", "optional": 3}"#).unwrap();
        assert_eq!(
            value,
            Expanded { init: "a".into(), optional: Some(3), with_default: "foo".into() }
        );

        let (map, lacunas) = convergent
            .value_mux(JsonEndec::new("test"))
            .mux(br#"{"init": "a", "withDefault": "bar"}"#)
            .unwrap();
        assert_eq!(Value::Object(map), json!({"init": "a", "withDefault": "bar"}));
        assert!(lacunas.is_empty());
    }

    #[test]
    fn test_mux_fn_is_shareable() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let lineage = crate::exemplars::rename(LineageOptions::default()).unwrap();
        let mux = new_byte_mux(&lineage.latest(), JsonEndec::new("test")).into_fn();
        assert_send_sync(&mux);

        let input = br#"{"before": "x", "unchanged": "y"}"#;
        let out = std::thread::spawn(move || mux(input).unwrap().0)
            .join()
            .unwrap();
        assert_eq!(out, br#"{"after":"x","unchanged":"y"}"#.to_vec());
    }
}
