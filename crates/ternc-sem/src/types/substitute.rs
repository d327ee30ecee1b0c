//! Deep cloning under a generic substitution.
//!
//! `clone_with` produces a fresh structural copy with a type-variable
//! map applied. Substitution has exactly two entry points into a type:
//! a [`super::ReferenceType`] whose first path segment names a bound
//! generic, and a bare [`super::GenericType`] node. Everything else is
//! rebuilt recursively with fresh memo cells, so an instantiated body
//! starts unresolved and unhashed.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use ternc_util::Symbol;

use super::{
    ClassAttribute, DataType, FunctionArgument, InterfaceMethod, StructField, Ty, TypeKind,
    VariantParameter,
};

/// The generic-parameter binding applied during cloning.
pub type Substitution = FxHashMap<Symbol, Ty>;

impl InterfaceMethod {
    /// Clone the method with the substitution applied to its parameter
    /// and return types. The UID memo is reset; an instantiated method
    /// has its own canonical serialization.
    pub fn clone_with(&self, subst: &Substitution) -> Rc<InterfaceMethod> {
        // A method's own generic parameters shadow the declaration's.
        let mut narrowed;
        let effective = if self.generics.is_empty() {
            subst
        } else {
            narrowed = subst.clone();
            for g in &self.generics {
                narrowed.remove(&g.name);
            }
            &narrowed
        };
        let params = self
            .params
            .iter()
            .map(|p| FunctionArgument {
                name: p.name,
                ty: p.ty.clone_with(effective),
                is_mut: p.is_mut,
            })
            .collect();
        let method = InterfaceMethod {
            name: self.name,
            params,
            ret: self.ret.clone_with(effective),
            is_static: self.is_static,
            generics: self.generics.clone(),
            uid: std::cell::Cell::new(None),
        };
        Rc::new(method)
    }
}

impl DataType {
    /// Deep copy with a substitution applied.
    ///
    /// `clone_with(&Substitution::default())` is a plain structural
    /// clone: same serialization, same hash, fresh memo state.
    pub fn clone_with(&self, subst: &Substitution) -> Ty {
        let span = self.span;
        match &self.kind {
            TypeKind::Basic(k) => DataType::basic(*k, span),
            TypeKind::LiteralInt(l) => DataType::literal_int(l.width_hint, span),
            TypeKind::Bool => DataType::bool_type(span),
            TypeKind::Null => DataType::null(span),
            TypeKind::Void => DataType::void(span),
            TypeKind::Unreachable => DataType::unreachable(span),
            TypeKind::Unset => DataType::unset(span),
            TypeKind::Array(a) => DataType::array(a.element.clone_with(subst), span),
            TypeKind::Tuple(t) => DataType::tuple(
                t.elements.iter().map(|e| e.clone_with(subst)).collect(),
                span,
            ),
            TypeKind::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|f| StructField {
                        name: f.name,
                        ty: f.ty.clone_with(subst),
                    })
                    .collect();
                if s.is_strict {
                    DataType::strict_struct(fields, span)
                } else {
                    DataType::struct_type(fields, span)
                }
            }
            TypeKind::PartialStruct(p) => {
                DataType::partial_struct(p.inner.clone_with(subst), span)
            }
            TypeKind::Enum(e) => DataType::enum_type(e.fields.clone(), e.repr, span),
            TypeKind::StringEnum(s) => DataType::string_enum(s.values.clone(), span),
            TypeKind::Class(c) => {
                let attributes = c
                    .attributes
                    .iter()
                    .map(|a| ClassAttribute {
                        name: a.name,
                        ty: a.ty.clone_with(subst),
                        is_static: a.is_static,
                    })
                    .collect();
                let methods = c.methods.iter().map(|m| m.clone_with(subst)).collect();
                let supers = c.supers.iter().map(|s| s.clone_with(subst)).collect();
                DataType::class(attributes, methods, supers, span)
            }
            TypeKind::Interface(i) => {
                let methods = i.methods.iter().map(|m| m.clone_with(subst)).collect();
                let supers = i.supers.iter().map(|s| s.clone_with(subst)).collect();
                DataType::interface(methods, supers, span)
            }
            TypeKind::Join(j) => {
                // The flat interface is a resolution artifact; the clone
                // starts unflattened.
                DataType::join(j.left.clone_with(subst), j.right.clone_with(subst), span)
            }
            TypeKind::Variant(v) => {
                let constructors = v
                    .constructors
                    .iter()
                    .map(|c| c.clone_with(subst))
                    .collect();
                DataType::variant(constructors, span)
            }
            TypeKind::VariantConstructor(vc) => {
                let params = vc
                    .params
                    .iter()
                    .map(|p| VariantParameter {
                        name: p.name,
                        ty: p.ty.clone_with(subst),
                    })
                    .collect();
                let clone = DataType::variant_constructor(vc.name, params, span);
                if let TypeKind::VariantConstructor(new_vc) = &clone.kind {
                    new_vc.tag.set(vc.tag.get());
                }
                clone
            }
            TypeKind::Function(f) => {
                let params = f
                    .params
                    .iter()
                    .map(|p| FunctionArgument {
                        name: p.name,
                        ty: p.ty.clone_with(subst),
                        is_mut: p.is_mut,
                    })
                    .collect();
                if f.is_coroutine {
                    DataType::coroutine_function(params, f.ret.clone_with(subst), span)
                } else {
                    DataType::function(params, f.ret.clone_with(subst), span)
                }
            }
            TypeKind::Coroutine(c) => DataType::coroutine(c.fn_type.clone_with(subst), span),
            TypeKind::Nullable(n) => DataType::nullable(n.inner.clone_with(subst), span),
            TypeKind::Reference(r) => {
                // A reference whose head names a bound generic IS the
                // substitution entry point: hand back the binding.
                if let Some(first) = r.path.first() {
                    if let Some(mapped) = subst.get(first) {
                        return mapped.clone();
                    }
                }
                let clone = DataType::reference(
                    r.path.clone(),
                    r.type_args.iter().map(|a| a.clone_with(subst)).collect(),
                    span,
                );
                if let TypeKind::Reference(new_r) = &clone.kind {
                    *new_r.usage_ctx.borrow_mut() = r.usage_ctx.borrow().clone();
                }
                clone
            }
            TypeKind::Generic(g) => match subst.get(&g.name) {
                Some(mapped) => mapped.clone(),
                None => DataType::generic(
                    g.name,
                    g.constraint.as_ref().map(|c| c.clone_with(subst)),
                    span,
                ),
            },
            TypeKind::Union(u) => DataType::union(
                u.members.iter().map(|m| m.clone_with(subst)).collect(),
                span,
            ),
            TypeKind::Lock(l) => DataType::lock(l.ret.clone_with(subst), span),
            TypeKind::Namespace(ns) => DataType::namespace(ns.decl.clone(), span),
            TypeKind::FfiNamespace(ns) => DataType::ffi_namespace(ns.decl.clone(), span),
            TypeKind::FfiMethod(m) => {
                DataType::ffi_method(m.method.clone_with(subst), m.parent, span)
            }
            TypeKind::MetaClass(m) => DataType::meta_class(
                m.class.clone_with(subst),
                m.generics.clone(),
                m.type_args.iter().map(|a| a.clone_with(subst)).collect(),
                span,
            ),
            TypeKind::MetaInterface(m) => {
                DataType::meta_interface(m.interface.clone_with(subst), span)
            }
            TypeKind::MetaVariant(m) => DataType::meta_variant(
                m.variant.clone_with(subst),
                m.type_args.iter().map(|a| a.clone_with(subst)).collect(),
                span,
            ),
            TypeKind::MetaVariantConstructor(m) => DataType::meta_variant_constructor(
                m.constructor.clone_with(subst),
                m.type_args.iter().map(|a| a.clone_with(subst)).collect(),
                span,
            ),
            TypeKind::MetaEnum(m) => DataType::meta_enum(m.enum_type.clone_with(subst), span),
        }
    }
}
