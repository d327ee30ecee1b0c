//! Generic parameter extraction: unification of a parametric pattern
//! against a concrete usage type.
//!
//! Given a declared pattern `P` mentioning generic parameters and a
//! concrete type `C`, `extract_generics` walks both in lockstep and
//! fills the binding `{name -> type}` so that substituting the binding
//! into `P` yields `C`. A reference in the pattern whose single path
//! segment names a declared generic is a binding site; any other
//! reference is resolved in *partial* mode so its generic body stays
//! structural, and the walk continues through the raw body with the
//! reference's own arguments mapped in.
//!
//! Union constraints are never unified through; the caller filters
//! acceptable instantiations with the compatibility engine instead.

use rustc_hash::FxHashMap;
use ternc_util::{Span, Symbol};

use crate::compat::{are_types_identical, match_types};
use crate::context::Context;
use crate::error::{SemErrorKind, SemResult};
use crate::guards;
use crate::resolve::{resolve, resolve_partial};
use crate::types::substitute::Substitution;
use crate::types::{dealias, flatten_join, GenericDecl, InterfaceMethod, Ty, TypeKind};

/// The binding produced by extraction.
pub type GenericBinding = FxHashMap<Symbol, Ty>;

/// Fill `out` with the generic bindings that make `pattern` equal to
/// `concrete`.
pub fn extract_generics(
    ctx: &Context,
    pattern: &Ty,
    concrete: &Ty,
    declared: &[GenericDecl],
    out: &mut GenericBinding,
) -> SemResult<()> {
    resolve(ctx, concrete)?;
    extract(ctx, pattern, concrete, declared, out)
}

fn extract(
    ctx: &Context,
    pattern: &Ty,
    concrete: &Ty,
    declared: &[GenericDecl],
    out: &mut GenericBinding,
) -> SemResult<()> {
    let _guard = match guards::enter_extract(pattern.structural_hash()) {
        Some(guard) => guard,
        None => return Ok(()),
    };

    let c = flatten_join(&dealias(concrete));

    match &pattern.kind {
        TypeKind::Reference(r) => {
            if r.path.len() == 1 && r.type_args.is_empty() {
                let name = r.path[0];
                if declared.iter().any(|g| g.name == name) {
                    return bind(ctx, out, name, concrete, pattern.span);
                }
            }
            resolve_partial(ctx, pattern)?;
            let Some(raw) = r.base() else {
                // In-flight cycle further up the pattern; nothing new to
                // learn on this path.
                return Ok(());
            };
            let body = match r.base_decl() {
                Some(decl) if decl.is_generic() => {
                    let mut subst = Substitution::default();
                    for (param, arg) in decl.generic_params.iter().zip(&r.type_args) {
                        subst.insert(param.name, arg.clone());
                    }
                    raw.clone_with(&subst)
                }
                _ => raw,
            };
            extract(ctx, &body, &c, declared, out)
        }

        TypeKind::Generic(g) => {
            if declared.iter().any(|d| d.name == g.name) {
                bind(ctx, out, g.name, concrete, pattern.span)
            } else {
                Ok(())
            }
        }

        // Constraint unions are filtered by the matcher, never unified.
        TypeKind::Union(_) => Ok(()),

        TypeKind::Unset => Ok(()),

        TypeKind::Array(pe) => match &c.kind {
            TypeKind::Array(ca) => extract(ctx, &pe.element, &ca.element, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Tuple(pe) => match &c.kind {
            TypeKind::Tuple(ca) => {
                if pe.elements.len() != ca.elements.len() {
                    return Err(shape_err(ctx, pattern, &c, pattern.span));
                }
                for (p, a) in pe.elements.iter().zip(&ca.elements) {
                    extract(ctx, p, a, declared, out)?;
                }
                Ok(())
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Nullable(pe) => match &c.kind {
            TypeKind::Nullable(ca) => extract(ctx, &pe.inner, &ca.inner, declared, out),
            TypeKind::Null => Ok(()),
            _ => extract(ctx, &pe.inner, &c, declared, out),
        },

        TypeKind::Struct(pe) => match &c.kind {
            TypeKind::Struct(ca) => {
                for field in &pe.fields {
                    let Some(found) = ca.fields.iter().find(|f| f.name == field.name) else {
                        return Err(ctx.raise(
                            SemErrorKind::ShapeMismatch {
                                detail: format!(
                                    "struct field `{}` is missing in `{}`",
                                    field.name,
                                    c.shortname()
                                ),
                            },
                            pattern.span,
                        ));
                    };
                    extract(ctx, &field.ty, &found.ty, declared, out)?;
                }
                Ok(())
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::PartialStruct(pe) => match &c.kind {
            TypeKind::PartialStruct(ca) => extract(ctx, &pe.inner, &ca.inner, declared, out),
            TypeKind::Struct(_) => extract(ctx, &pe.inner, &c, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Function(pe) => match &c.kind {
            TypeKind::Function(ca) => {
                if pe.params.len() != ca.params.len() {
                    return Err(shape_err(ctx, pattern, &c, pattern.span));
                }
                for (p, a) in pe.params.iter().zip(&ca.params) {
                    extract(ctx, &p.ty, &a.ty, declared, out)?;
                }
                if matches!(pe.ret.kind, TypeKind::Unset) {
                    return Ok(());
                }
                extract(ctx, &pe.ret, &ca.ret, declared, out)
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Coroutine(pe) => match &c.kind {
            TypeKind::Coroutine(ca) => extract(ctx, &pe.fn_type, &ca.fn_type, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Interface(pe) => {
            let concrete_methods: Vec<_> = match &c.kind {
                TypeKind::Interface(ca) => ca.methods.clone(),
                TypeKind::Class(ca) => ca
                    .methods
                    .iter()
                    .filter(|m| !m.is_static)
                    .cloned()
                    .collect(),
                _ => return Err(shape_err(ctx, pattern, &c, pattern.span)),
            };
            for method in &pe.methods {
                extract_method(ctx, method, &concrete_methods, &c, declared, out, pattern.span)?;
            }
            Ok(())
        }

        TypeKind::Class(pe) => match &c.kind {
            TypeKind::Class(ca) => {
                for attr in &pe.attributes {
                    let Some(found) = ca.attributes.iter().find(|a| a.name == attr.name) else {
                        return Err(ctx.raise(
                            SemErrorKind::ShapeMismatch {
                                detail: format!("class attribute `{}` is missing", attr.name),
                            },
                            pattern.span,
                        ));
                    };
                    extract(ctx, &attr.ty, &found.ty, declared, out)?;
                }
                for method in &pe.methods {
                    extract_method(ctx, method, &ca.methods, &c, declared, out, pattern.span)?;
                }
                Ok(())
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Join(pe) => {
            if let Some(flat) = pe.flattened() {
                extract(ctx, &flat, &c, declared, out)
            } else {
                extract(ctx, &pe.left, &c, declared, out)?;
                extract(ctx, &pe.right, &c, declared, out)
            }
        }

        TypeKind::Variant(pe) => match &c.kind {
            TypeKind::Variant(ca) => {
                if pe.constructors.len() != ca.constructors.len() {
                    return Err(shape_err(ctx, pattern, &c, pattern.span));
                }
                for ctor in &pe.constructors {
                    let TypeKind::VariantConstructor(pvc) = &ctor.kind else {
                        continue;
                    };
                    let Some(found) = ca.constructor(pvc.name) else {
                        return Err(ctx.raise(
                            SemErrorKind::VariantConstructorNotFound {
                                name: pvc.name.as_str().to_string(),
                            },
                            pattern.span,
                        ));
                    };
                    extract(ctx, ctor, &found, declared, out)?;
                }
                Ok(())
            }
            // Navigating a lone constructor into the pattern variant.
            TypeKind::VariantConstructor(cvc) => {
                let Some(slot) = pe.constructor(cvc.name) else {
                    return Err(ctx.raise(
                        SemErrorKind::VariantConstructorNotFound {
                            name: cvc.name.as_str().to_string(),
                        },
                        pattern.span,
                    ));
                };
                extract(ctx, &slot, &c, declared, out)
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::VariantConstructor(pe) => match &c.kind {
            TypeKind::VariantConstructor(ca) => {
                if pe.name != ca.name || pe.params.len() != ca.params.len() {
                    return Err(shape_err(ctx, pattern, &c, pattern.span));
                }
                for (p, a) in pe.params.iter().zip(&ca.params) {
                    extract(ctx, &p.ty, &a.ty, declared, out)?;
                }
                Ok(())
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::Lock(pe) => match &c.kind {
            TypeKind::Lock(ca) => extract(ctx, &pe.ret, &ca.ret, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        TypeKind::MetaClass(pe) => match &c.kind {
            TypeKind::MetaClass(ca) => extract(ctx, &pe.class, &ca.class, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },
        TypeKind::MetaInterface(pe) => match &c.kind {
            TypeKind::MetaInterface(ca) => extract(ctx, &pe.interface, &ca.interface, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },
        TypeKind::MetaVariant(pe) => match &c.kind {
            TypeKind::MetaVariant(ca) => extract(ctx, &pe.variant, &ca.variant, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },
        TypeKind::MetaVariantConstructor(pe) => match &c.kind {
            TypeKind::MetaVariantConstructor(ca) => {
                extract(ctx, &pe.constructor, &ca.constructor, declared, out)
            }
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },
        TypeKind::MetaEnum(pe) => match &c.kind {
            TypeKind::MetaEnum(ca) => extract(ctx, &pe.enum_type, &ca.enum_type, declared, out),
            _ => Err(shape_err(ctx, pattern, &c, pattern.span)),
        },

        // Leaves carry no generics; the outer shapes still have to
        // agree, which the matcher decides.
        TypeKind::Basic(_)
        | TypeKind::LiteralInt(_)
        | TypeKind::Bool
        | TypeKind::Null
        | TypeKind::Void
        | TypeKind::Unreachable
        | TypeKind::Enum(_)
        | TypeKind::StringEnum(_)
        | TypeKind::Namespace(_)
        | TypeKind::FfiNamespace(_)
        | TypeKind::FfiMethod(_) => {
            if match_types(ctx, pattern, &c, false).is_ok() {
                Ok(())
            } else {
                Err(shape_err(ctx, pattern, &c, pattern.span))
            }
        }
    }
}

/// Unify one pattern method against the concrete method list. Overload
/// sets that stay ambiguous at extraction time are skipped; the
/// compatibility engine re-checks the chosen instantiation afterwards.
fn extract_method(
    ctx: &Context,
    method: &InterfaceMethod,
    concrete_methods: &[std::rc::Rc<InterfaceMethod>],
    concrete: &Ty,
    declared: &[GenericDecl],
    out: &mut GenericBinding,
    span: Span,
) -> SemResult<()> {
    let candidates: Vec<_> = concrete_methods
        .iter()
        .filter(|m| m.name == method.name && m.params.len() == method.params.len())
        .collect();
    match candidates.len() {
        0 => Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: format!(
                    "method `{}` is missing in `{}`",
                    method.name,
                    concrete.shortname()
                ),
            },
            span,
        )),
        1 => {
            let found = candidates[0];
            for (p, a) in method.params.iter().zip(&found.params) {
                extract(ctx, &p.ty, &a.ty, declared, out)?;
            }
            if matches!(method.ret.kind, TypeKind::Unset) {
                return Ok(());
            }
            extract(ctx, &method.ret, &found.ret, declared, out)
        }
        _ => Ok(()),
    }
}

fn bind(
    ctx: &Context,
    out: &mut GenericBinding,
    name: Symbol,
    concrete: &Ty,
    span: Span,
) -> SemResult<()> {
    if let Some(existing) = out.get(&name) {
        if !are_types_identical(ctx, existing, concrete) {
            return Err(ctx.raise(
                SemErrorKind::ShapeMismatch {
                    detail: format!(
                        "generic `{}` bound to both `{}` and `{}`",
                        name,
                        existing.shortname(),
                        concrete.shortname()
                    ),
                },
                span,
            ));
        }
        return Ok(());
    }
    out.insert(name, concrete.clone());
    Ok(())
}

fn shape_err(
    ctx: &Context,
    pattern: &Ty,
    concrete: &Ty,
    span: Span,
) -> crate::error::SemError {
    ctx.raise(
        SemErrorKind::ShapeMismatch {
            detail: format!(
                "cannot unify `{}` with `{}`",
                concrete.shortname(),
                pattern.shortname()
            ),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclaredType;
    use crate::types::{BasicKind, DataType, FunctionArgument, StructField, VariantParameter};
    use std::rc::Rc;
    use ternc_util::Handler;

    fn sp() -> Span {
        Span::DUMMY
    }

    fn root() -> Context {
        Context::new("main", Rc::new(Handler::new()))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn u32_ty() -> Ty {
        DataType::basic(BasicKind::U32, sp())
    }

    fn t_ref() -> Ty {
        DataType::reference(vec![sym("T")], vec![], sp())
    }

    fn declared_t() -> Vec<GenericDecl> {
        vec![GenericDecl::new(sym("T"))]
    }

    #[test]
    fn test_extract_direct_binding() {
        let ctx = root();
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &t_ref(), &u32_ty(), &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }

    #[test]
    fn test_extract_through_array() {
        let ctx = root();
        let pattern = DataType::array(t_ref(), sp());
        let concrete = DataType::array(u32_ty(), sp());
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }

    #[test]
    fn test_extract_through_struct_fields() {
        let ctx = root();
        let pattern = DataType::struct_type(
            vec![
                StructField {
                    name: sym("head"),
                    ty: t_ref(),
                },
                StructField {
                    name: sym("count"),
                    ty: u32_ty(),
                },
            ],
            sp(),
        );
        let concrete = DataType::struct_type(
            vec![
                StructField {
                    name: sym("head"),
                    ty: DataType::bool_type(sp()),
                },
                StructField {
                    name: sym("count"),
                    ty: u32_ty(),
                },
            ],
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "bool");
    }

    #[test]
    fn test_extract_through_function() {
        let ctx = root();
        let pattern = DataType::function(
            vec![FunctionArgument::new(sym("x"), t_ref())],
            t_ref(),
            sp(),
        );
        let concrete = DataType::function(
            vec![FunctionArgument::new(sym("x"), u32_ty())],
            u32_ty(),
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }

    #[test]
    fn test_conflicting_bindings_rejected() {
        let ctx = root();
        let pattern = DataType::tuple(vec![t_ref(), t_ref()], sp());
        let concrete = DataType::tuple(vec![u32_ty(), DataType::bool_type(sp())], sp());
        let mut out = GenericBinding::default();
        let err =
            extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap_err();
        assert!(matches!(err.kind, SemErrorKind::ShapeMismatch { .. }));
    }

    #[test]
    fn test_repeated_identical_binding_ok() {
        let ctx = root();
        let pattern = DataType::tuple(vec![t_ref(), t_ref()], sp());
        let concrete = DataType::tuple(vec![u32_ty(), u32_ty()], sp());
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_shape_mismatch_reported() {
        let ctx = root();
        let pattern = DataType::array(t_ref(), sp());
        let concrete = DataType::bool_type(sp());
        let mut out = GenericBinding::default();
        let err =
            extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap_err();
        assert!(matches!(err.kind, SemErrorKind::ShapeMismatch { .. }));
        assert!(ctx.handler().has_errors());
    }

    #[test]
    fn test_extract_through_named_generic_reference() {
        let ctx = root();
        // Box<U> is declared with its own parameter name.
        ctx.declare_type(DeclaredType::new(
            sym("BoxG"),
            sp(),
            vec![GenericDecl::new(sym("U"))],
            DataType::struct_type(
                vec![StructField {
                    name: sym("value"),
                    ty: DataType::reference(vec![sym("U")], vec![], sp()),
                }],
                sp(),
            ),
        ));

        // Pattern: BoxG<T>; concrete: BoxG<u32> resolved.
        let pattern = DataType::reference(vec![sym("BoxG")], vec![t_ref()], sp());
        let concrete = DataType::reference(vec![sym("BoxG")], vec![u32_ty()], sp());
        crate::resolve::resolve(&ctx, &concrete).unwrap();

        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
        // Partial mode must leave the declaration cache with only the
        // concrete instantiation.
        let Some(crate::decl::SymbolEntry::Type(decl)) = ctx.lookup(sym("BoxG")) else {
            panic!()
        };
        assert_eq!(decl.cache_len(), 1);
    }

    #[test]
    fn test_extract_through_variant() {
        let ctx = root();
        let pattern = DataType::variant(
            vec![
                DataType::variant_constructor(sym("None"), vec![], sp()),
                DataType::variant_constructor(
                    sym("Some"),
                    vec![VariantParameter {
                        name: sym("value"),
                        ty: t_ref(),
                    }],
                    sp(),
                ),
            ],
            sp(),
        );
        let concrete = DataType::variant(
            vec![
                DataType::variant_constructor(sym("None"), vec![], sp()),
                DataType::variant_constructor(
                    sym("Some"),
                    vec![VariantParameter {
                        name: sym("value"),
                        ty: u32_ty(),
                    }],
                    sp(),
                ),
            ],
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }

    #[test]
    fn test_extract_from_lone_constructor() {
        let ctx = root();
        let pattern = DataType::variant(
            vec![DataType::variant_constructor(
                sym("Wrap"),
                vec![VariantParameter {
                    name: sym("value"),
                    ty: t_ref(),
                }],
                sp(),
            )],
            sp(),
        );
        let concrete = DataType::variant_constructor(
            sym("Wrap"),
            vec![VariantParameter {
                name: sym("value"),
                ty: u32_ty(),
            }],
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }

    #[test]
    fn test_substitution_round_trip() {
        let ctx = root();
        let pattern = DataType::struct_type(
            vec![
                StructField {
                    name: sym("items"),
                    ty: DataType::array(t_ref(), sp()),
                },
                StructField {
                    name: sym("len"),
                    ty: u32_ty(),
                },
            ],
            sp(),
        );
        let concrete = DataType::struct_type(
            vec![
                StructField {
                    name: sym("items"),
                    ty: DataType::array(DataType::basic(BasicKind::I64, sp()), sp()),
                },
                StructField {
                    name: sym("len"),
                    ty: u32_ty(),
                },
            ],
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();

        // substitute(P, extract(P, C)) == C structurally.
        let rebuilt = pattern.clone_with(&out);
        assert_eq!(rebuilt.structural_hash(), concrete.structural_hash());
    }

    #[test]
    fn test_union_constraint_not_unified() {
        let ctx = root();
        let pattern = DataType::union(vec![u32_ty(), DataType::bool_type(sp())], sp());
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &u32_ty(), &declared_t(), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_nullable_absorption_during_extraction() {
        let ctx = root();
        let pattern = DataType::nullable(DataType::array(t_ref(), sp()), sp());
        let concrete = DataType::array(u32_ty(), sp());
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared_t(), &mut out).unwrap();
        assert_eq!(out[&sym("T")].serialize(false), "u32");
    }
}
