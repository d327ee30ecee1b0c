//! The type compatibility engine.
//!
//! `match_types(ctx, expected, actual, strict)` decides whether `actual`
//! is assignable to `expected`. Non-strict mode is assignability: integer
//! widening, interface width-subtyping, nullable absorption, literal-int
//! promotion. Strict mode is structural identity and backs
//! [`are_types_identical`], which in turn backs overload-collision
//! detection.
//!
//! The wrapper resolves both sides, promotes strictness for strict
//! structural types, then consults the coinductive match stack (re-entry
//! on the same key is a cycle and answers `Ok`) and the per-context memo.
//! Stack and memo deliberately share the `(hash, hash, strict)` key
//! shape.
//!
//! The matcher never records diagnostics; it returns the first failure
//! message and lets the caller decide.

use ternc_util::Span;

use crate::context::Context;
use crate::error::{MatchResult, SemErrorKind, SemResult, TypeMismatch};
use crate::guards;
use crate::resolve::resolve;
use crate::types::{
    allowed_nullable, dealias, flatten_join, is_strict, FunctionArgument, InterfaceMethod, Ty,
    TypeKind,
};

/// Decide whether `actual` is assignable to `expected`.
pub fn match_types(ctx: &Context, expected: &Ty, actual: &Ty, strict: bool) -> MatchResult {
    if let Err(err) = resolve(ctx, expected) {
        return Err(TypeMismatch::new(err.to_string()));
    }
    if let Err(err) = resolve(ctx, actual) {
        return Err(TypeMismatch::new(err.to_string()));
    }

    let strict = strict || is_strict(expected) || is_strict(actual);
    let key = (
        expected.structural_hash(),
        actual.structural_hash(),
        strict,
    );

    // Re-entry on an in-progress pair is a cycle through mutually
    // recursive types; coinductively, the pair matches.
    let _guard = match guards::enter_match(key) {
        Some(guard) => guard,
        None => return Ok(()),
    };

    if let Some(memoized) = ctx.memo_get(&key) {
        return memoized;
    }

    let result = match_core(ctx, expected, actual, strict);
    ctx.memo_insert(key, result.clone());
    result
}

/// Structural identity: a strict match in both names.
pub fn are_types_identical(ctx: &Context, a: &Ty, b: &Ty) -> bool {
    match_types(ctx, a, b, true).is_ok()
}

/// Overload-collision predicate on two function types: parameter lists
/// pairwise identical (type and mutability), return types ignored.
pub fn are_signatures_identical(ctx: &Context, a: &Ty, b: &Ty) -> bool {
    let a = dealias(a);
    let b = dealias(b);
    match (&a.kind, &b.kind) {
        (TypeKind::Function(fa), TypeKind::Function(fb)) => {
            fa.is_coroutine == fb.is_coroutine && params_identical(ctx, &fa.params, &fb.params)
        }
        _ => false,
    }
}

/// Whether two parameter lists are pairwise identical.
pub(crate) fn params_identical(
    ctx: &Context,
    a: &[FunctionArgument],
    b: &[FunctionArgument],
) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(pa, pb)| pa.is_mut == pb.is_mut && are_types_identical(ctx, &pa.ty, &pb.ty))
}

/// Explicit cast admissibility: basic scalars cast freely among
/// themselves, everything else needs structural identity.
pub fn can_cast(ctx: &Context, source: &Ty, target: &Ty) -> MatchResult {
    if let Err(err) = resolve(ctx, source) {
        return Err(TypeMismatch::new(err.to_string()));
    }
    if let Err(err) = resolve(ctx, target) {
        return Err(TypeMismatch::new(err.to_string()));
    }
    let s = dealias(source);
    let t = dealias(target);
    let scalar = |ty: &Ty| matches!(ty.kind, TypeKind::Basic(_) | TypeKind::LiteralInt(_));
    if scalar(&s) && scalar(&t) {
        return Ok(());
    }
    match_types(ctx, target, source, true)
}

/// Policy check for `x?.m()`: the call's result type must survive being
/// made nullable. `void` is allowed (there is no result to wrap).
pub fn optional_chain_return(ctx: &Context, ret: &Ty, span: Span) -> SemResult<()> {
    resolve(ctx, ret)?;
    let target = dealias(ret);
    match &target.kind {
        TypeKind::Void | TypeKind::Nullable(_) => Ok(()),
        _ if allowed_nullable(ret) => Ok(()),
        _ => Err(ctx.raise(
            SemErrorKind::NullabilityViolation {
                detail: format!(
                    "result type `{}` of an optional call cannot be made nullable",
                    ret.shortname()
                ),
            },
            span,
        )),
    }
}

/// `?.` requires a nullable receiver.
pub fn check_optional_access(ctx: &Context, receiver: &Ty, span: Span) -> SemResult<()> {
    resolve(ctx, receiver)?;
    match &dealias(receiver).kind {
        TypeKind::Nullable(_) => Ok(()),
        _ => Err(ctx.raise(
            SemErrorKind::NullabilityViolation {
                detail: format!("`?.` used on non-nullable type `{}`", receiver.shortname()),
            },
            span,
        )),
    }
}

/// `.` requires a non-nullable receiver.
pub fn check_member_access(ctx: &Context, receiver: &Ty, span: Span) -> SemResult<()> {
    resolve(ctx, receiver)?;
    match &dealias(receiver).kind {
        TypeKind::Nullable(_) => Err(ctx.raise(
            SemErrorKind::NullabilityViolation {
                detail: format!(
                    "`.` used on nullable type `{}`; use `?.`",
                    receiver.shortname()
                ),
            },
            span,
        )),
        _ => Ok(()),
    }
}

fn mismatch(expected: &Ty, actual: &Ty) -> MatchResult {
    Err(TypeMismatch::new(format!(
        "type `{}` is not assignable to `{}`",
        actual.shortname(),
        expected.shortname()
    )))
}

/// Kinds that must have been substituted or narrowed away before any
/// matching happens. Reaching one is an engine bug, not a user error.
fn internal_kind(ty: &Ty) -> bool {
    matches!(
        ty.kind,
        TypeKind::Union(_) | TypeKind::Unset | TypeKind::Generic(_) | TypeKind::FfiMethod(_)
    )
}

fn match_core(ctx: &Context, expected: &Ty, actual: &Ty, strict: bool) -> MatchResult {
    let e = flatten_join(&dealias(expected));
    let a = flatten_join(&dealias(actual));

    if internal_kind(&e) || internal_kind(&a) {
        return Err(TypeMismatch::new(format!(
            "internal: `{}` must not reach the matcher",
            if internal_kind(&e) {
                e.shortname()
            } else {
                a.shortname()
            }
        )));
    }

    // The bottom type flows into anything.
    if matches!(a.kind, TypeKind::Unreachable) {
        return Ok(());
    }

    match &e.kind {
        TypeKind::Void => match a.kind {
            TypeKind::Void => Ok(()),
            _ => mismatch(&e, &a),
        },

        TypeKind::Unreachable => mismatch(&e, &a),

        TypeKind::Basic(ke) => match &a.kind {
            // TODO: reject literals whose width_hint exceeds the target
            // kind's width instead of accepting every literal.
            TypeKind::LiteralInt(_) if !strict => Ok(()),
            TypeKind::Basic(ka) => {
                let ok = if strict { ke == ka } else { widens(*ke, *ka) };
                if ok {
                    Ok(())
                } else {
                    mismatch(&e, &a)
                }
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::LiteralInt(_) => match a.kind {
            TypeKind::LiteralInt(_) => Ok(()),
            _ => mismatch(&e, &a),
        },

        TypeKind::Bool => match a.kind {
            TypeKind::Bool => Ok(()),
            _ => mismatch(&e, &a),
        },

        TypeKind::Null => match a.kind {
            TypeKind::Null => Ok(()),
            _ => mismatch(&e, &a),
        },

        TypeKind::Array(ae) => match &a.kind {
            TypeKind::Array(aa) => match_types(ctx, &ae.element, &aa.element, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::Tuple(te) => match &a.kind {
            TypeKind::Tuple(ta) => {
                if te.elements.len() != ta.elements.len() {
                    return mismatch(&e, &a);
                }
                for (ee, ea) in te.elements.iter().zip(&ta.elements) {
                    match_types(ctx, ee, ea, strict)?;
                }
                Ok(())
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Nullable(ne) => match &a.kind {
            TypeKind::Null => Ok(()),
            TypeKind::Nullable(na) => match_types(ctx, &ne.inner, &na.inner, strict),
            // Absorption: a non-nullable value fills a nullable slot.
            _ if !strict => match_types(ctx, &ne.inner, &a, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::Enum(ee) => match &a.kind {
            TypeKind::Enum(ea) => {
                if ee.fields.len() != ea.fields.len() {
                    return mismatch(&e, &a);
                }
                let agree = ee
                    .fields
                    .iter()
                    .zip(&ea.fields)
                    .all(|(fe, fa)| fe.name == fa.name && fe.value == fa.value);
                if agree {
                    Ok(())
                } else {
                    mismatch(&e, &a)
                }
            }
            TypeKind::LiteralInt(_) if !strict => Ok(()),
            _ => mismatch(&e, &a),
        },

        TypeKind::StringEnum(se) => match &a.kind {
            TypeKind::StringEnum(sa) => {
                if strict {
                    if se.values == sa.values {
                        Ok(())
                    } else {
                        mismatch(&e, &a)
                    }
                } else if sa.values.iter().all(|v| se.values.contains(v)) {
                    Ok(())
                } else {
                    mismatch(&e, &a)
                }
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Function(fe) => match &a.kind {
            TypeKind::Function(fa) => {
                if fe.is_coroutine != fa.is_coroutine {
                    return mismatch(&e, &a);
                }
                match_signatures(ctx, &fe.params, &fe.ret, &fa.params, &fa.ret, strict).map_err(
                    |inner| {
                        TypeMismatch::new(format!(
                            "type `{}` is not assignable to `{}`: {}",
                            a.shortname(),
                            e.shortname(),
                            inner.0
                        ))
                    },
                )
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Coroutine(ce) => match &a.kind {
            TypeKind::Coroutine(ca) => match_types(ctx, &ce.fn_type, &ca.fn_type, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::Interface(ie) => match &a.kind {
            TypeKind::Interface(ia) => {
                if strict && ie.methods.len() != ia.methods.len() {
                    return mismatch(&e, &a);
                }
                for method in &ie.methods {
                    let found = ia
                        .methods
                        .iter()
                        .any(|am| method_compatible(ctx, method, am, strict));
                    if !found {
                        return Err(TypeMismatch::new(format!(
                            "method `{}` of `{}` is missing or incompatible in `{}`",
                            method.name,
                            e.shortname(),
                            a.shortname()
                        )));
                    }
                }
                Ok(())
            }
            // Structural conformance: a class satisfies an interface
            // through its instance methods.
            TypeKind::Class(ca) if !strict => {
                for method in &ie.methods {
                    let found = ca
                        .methods
                        .iter()
                        .filter(|am| !am.is_static)
                        .any(|am| method_compatible(ctx, method, am, strict));
                    if !found {
                        return Err(TypeMismatch::new(format!(
                            "class does not implement interface method `{}`",
                            method.name
                        )));
                    }
                }
                Ok(())
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Class(ce) => match &a.kind {
            TypeKind::Class(ca) => {
                if strict
                    && (ce.attributes.len() != ca.attributes.len()
                        || ce.methods.len() != ca.methods.len())
                {
                    return mismatch(&e, &a);
                }
                for attr in &ce.attributes {
                    let Some(found) = ca
                        .attributes
                        .iter()
                        .find(|aa| aa.name == attr.name && aa.is_static == attr.is_static)
                    else {
                        return Err(TypeMismatch::new(format!(
                            "class attribute `{}` is missing",
                            attr.name
                        )));
                    };
                    match_types(ctx, &attr.ty, &found.ty, strict)?;
                }
                for method in &ce.methods {
                    let candidates = ca
                        .methods
                        .iter()
                        .filter(|am| method_compatible(ctx, method, am, strict))
                        .count();
                    match candidates {
                        0 => {
                            return Err(TypeMismatch::new(format!(
                                "class method `{}` is missing or incompatible",
                                method.name
                            )))
                        }
                        1 => {}
                        _ => {
                            return Err(TypeMismatch::new(format!(
                                "class method `{}` resolves ambiguously",
                                method.name
                            )))
                        }
                    }
                }
                Ok(())
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Variant(ve) => match &a.kind {
            TypeKind::Variant(va) => {
                if ve.constructors.len() != va.constructors.len() {
                    return mismatch(&e, &a);
                }
                for (ce, ca) in ve.constructors.iter().zip(&va.constructors) {
                    match_types(ctx, ce, ca, strict)?;
                }
                Ok(())
            }
            // A constructor subsumes into its variant; the reverse
            // direction never holds.
            TypeKind::VariantConstructor(_) => {
                let found = ve
                    .constructors
                    .iter()
                    .any(|c| match_types(ctx, c, &a, strict).is_ok());
                if found {
                    Ok(())
                } else {
                    Err(TypeMismatch::new(format!(
                        "constructor `{}` does not belong to variant `{}`",
                        a.shortname(),
                        e.shortname()
                    )))
                }
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::VariantConstructor(vce) => match &a.kind {
            TypeKind::VariantConstructor(vca) => {
                if vce.name != vca.name || vce.params.len() != vca.params.len() {
                    return mismatch(&e, &a);
                }
                for (pe, pa) in vce.params.iter().zip(&vca.params) {
                    match_types(ctx, &pe.ty, &pa.ty, strict)?;
                }
                Ok(())
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::Struct(se) => match &a.kind {
            TypeKind::Struct(sa) => {
                if strict && se.fields.len() != sa.fields.len() {
                    return mismatch(&e, &a);
                }
                for field in &se.fields {
                    let Some(found) = sa.fields.iter().find(|fa| fa.name == field.name) else {
                        return Err(TypeMismatch::new(format!(
                            "struct field `{}` is missing in `{}`",
                            field.name,
                            a.shortname()
                        )));
                    };
                    match_types(ctx, &field.ty, &found.ty, strict)?;
                }
                Ok(())
            }
            _ => mismatch(&e, &a),
        },

        TypeKind::PartialStruct(pe) => match &a.kind {
            TypeKind::PartialStruct(pa) => match_types(ctx, &pe.inner, &pa.inner, strict),
            TypeKind::Struct(_) => match_types(ctx, &pe.inner, &a, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::Lock(le) => match &a.kind {
            TypeKind::Lock(la) => match_types(ctx, &le.ret, &la.ret, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::MetaClass(me) => match &a.kind {
            TypeKind::MetaClass(ma) => match_types(ctx, &me.class, &ma.class, strict),
            _ => mismatch(&e, &a),
        },
        TypeKind::MetaInterface(me) => match &a.kind {
            TypeKind::MetaInterface(ma) => match_types(ctx, &me.interface, &ma.interface, strict),
            _ => mismatch(&e, &a),
        },
        TypeKind::MetaVariant(me) => match &a.kind {
            TypeKind::MetaVariant(ma) => match_types(ctx, &me.variant, &ma.variant, strict),
            _ => mismatch(&e, &a),
        },
        TypeKind::MetaVariantConstructor(me) => match &a.kind {
            TypeKind::MetaVariantConstructor(ma) => {
                match_types(ctx, &me.constructor, &ma.constructor, strict)
            }
            _ => mismatch(&e, &a),
        },
        TypeKind::MetaEnum(me) => match &a.kind {
            TypeKind::MetaEnum(ma) => match_types(ctx, &me.enum_type, &ma.enum_type, strict),
            _ => mismatch(&e, &a),
        },

        TypeKind::Namespace(_) | TypeKind::FfiNamespace(_) => Err(TypeMismatch::new(format!(
            "`{}` is not a value type",
            e.shortname()
        ))),

        // A reference that stayed unresolved here is mid-cycle further
        // up the resolve stack. Two handles with the same path and
        // arguments name the same declaration, so they are equal; any
        // other pairing is undecidable and reported as internal.
        TypeKind::Reference(_) => match &a.kind {
            TypeKind::Reference(_) if e.structural_hash() == a.structural_hash() => Ok(()),
            _ => Err(TypeMismatch::new(format!(
                "internal: unresolved reference `{}` reached the matcher",
                e.shortname()
            ))),
        },

        TypeKind::Join(_) => Err(TypeMismatch::new(format!(
            "internal: unflattened join `{}` reached the matcher",
            e.shortname()
        ))),

        TypeKind::Union(_) | TypeKind::Unset | TypeKind::Generic(_) | TypeKind::FfiMethod(_) => {
            unreachable!("internal kinds filtered above")
        }
    }
}

/// The numeric widening table.
///
/// Within each family a wider expected kind accepts a narrower actual;
/// a strictly wider signed expected also accepts an unsigned actual.
fn widens(expected: crate::types::BasicKind, actual: crate::types::BasicKind) -> bool {
    if expected == actual {
        return true;
    }
    if expected.is_unsigned_int() && actual.is_unsigned_int() {
        return expected.family_rank() >= actual.family_rank();
    }
    if expected.is_signed_int() && actual.is_signed_int() {
        return expected.family_rank() >= actual.family_rank();
    }
    if expected.is_float() && actual.is_float() {
        return expected.family_rank() >= actual.family_rank();
    }
    if expected.is_signed_int() && actual.is_unsigned_int() {
        return expected.family_rank() > actual.family_rank();
    }
    false
}

/// Shared function-shape matching: arity, per-parameter mutability,
/// contravariant parameters, covariant return. An unset expected return
/// is an inference sink and matches anything.
fn match_signatures(
    ctx: &Context,
    e_params: &[FunctionArgument],
    e_ret: &Ty,
    a_params: &[FunctionArgument],
    a_ret: &Ty,
    strict: bool,
) -> MatchResult {
    if e_params.len() != a_params.len() {
        return Err(TypeMismatch::new("parameter count differs".to_string()));
    }
    for (pe, pa) in e_params.iter().zip(a_params) {
        if pe.is_mut != pa.is_mut {
            return Err(TypeMismatch::new(format!(
                "parameter `{}` differs in mutability",
                pe.name
            )));
        }
        // Contravariant: the actual function must accept at least what
        // the expected one does.
        match_types(ctx, &pa.ty, &pe.ty, strict)?;
    }
    if matches!(e_ret.kind, TypeKind::Unset) {
        return Ok(());
    }
    match_types(ctx, e_ret, a_ret, strict)
}

/// Whether an actual method satisfies an expected method slot.
fn method_compatible(
    ctx: &Context,
    expected: &InterfaceMethod,
    actual: &InterfaceMethod,
    strict: bool,
) -> bool {
    expected.name == actual.name
        && expected.is_static == actual.is_static
        && match_signatures(
            ctx,
            &expected.params,
            &expected.ret,
            &actual.params,
            &actual.ret,
            strict,
        )
        .is_ok()
}
