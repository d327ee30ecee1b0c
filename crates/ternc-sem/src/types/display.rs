//! Human-readable renderings of types for diagnostics.
//!
//! `shortname` is what error messages embed. It is deliberately lossy
//! and must never be used for identity; that is what the canonical
//! serialization in [`super::serialize`] is for.

use std::fmt;

use super::{DataType, FunctionArgument, TypeKind};

fn render_params(params: &[FunctionArgument]) -> String {
    params
        .iter()
        .map(|p| {
            if p.is_mut {
                format!("mut {}: {}", p.name, p.ty.shortname())
            } else {
                format!("{}: {}", p.name, p.ty.shortname())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl DataType {
    /// A human-readable rendering used in error messages, not for
    /// identity.
    pub fn shortname(&self) -> String {
        match &self.kind {
            TypeKind::Basic(k) => k.name().to_string(),
            TypeKind::LiteralInt(_) => "int literal".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Null => "null".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Unreachable => "unreachable".to_string(),
            TypeKind::Unset => "unset".to_string(),
            TypeKind::Array(a) => format!("{}[]", a.element.shortname()),
            TypeKind::Tuple(t) => {
                let elems = t
                    .elements
                    .iter()
                    .map(|e| e.shortname())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", elems)
            }
            TypeKind::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.ty.shortname()))
                    .collect::<Vec<_>>()
                    .join(", ");
                if s.is_strict {
                    format!("strict struct{{{}}}", fields)
                } else {
                    format!("struct{{{}}}", fields)
                }
            }
            TypeKind::PartialStruct(p) => format!("partial<{}>", p.inner.shortname()),
            TypeKind::Enum(e) => {
                let fields = e
                    .fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("enum{{{}}}", fields)
            }
            TypeKind::StringEnum(s) => s
                .values
                .iter()
                .map(|v| format!("\"{}\"", v))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Class(c) => {
                let attrs = c
                    .attributes
                    .iter()
                    .map(|a| format!("{}: {}", a.name, a.ty.shortname()))
                    .collect::<Vec<_>>();
                let methods = c
                    .methods
                    .iter()
                    .map(|m| format!("fn {}(..)", m.name))
                    .collect::<Vec<_>>();
                format!(
                    "class{{{}}}",
                    attrs.into_iter().chain(methods).collect::<Vec<_>>().join(", ")
                )
            }
            TypeKind::Interface(i) => {
                let methods = i
                    .methods
                    .iter()
                    .map(|m| {
                        format!(
                            "fn {}({}) -> {}",
                            m.name,
                            render_params(&m.params),
                            m.ret.shortname()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("interface{{{}}}", methods)
            }
            TypeKind::Join(j) => {
                format!("{} & {}", j.left.shortname(), j.right.shortname())
            }
            TypeKind::Variant(v) => {
                let ctors = v
                    .constructors
                    .iter()
                    .map(|c| c.shortname())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("variant{{{}}}", ctors)
            }
            TypeKind::VariantConstructor(vc) => {
                if vc.params.is_empty() {
                    vc.name.as_str().to_string()
                } else {
                    let params = vc
                        .params
                        .iter()
                        .map(|p| format!("{}: {}", p.name, p.ty.shortname()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}({})", vc.name, params)
                }
            }
            TypeKind::Function(f) => {
                let head = if f.is_coroutine { "cfn" } else { "fn" };
                format!(
                    "{}({}) -> {}",
                    head,
                    render_params(&f.params),
                    f.ret.shortname()
                )
            }
            TypeKind::Coroutine(c) => format!("coroutine<{}>", c.fn_type.shortname()),
            TypeKind::Nullable(n) => format!("{}?", n.inner.shortname()),
            TypeKind::Reference(r) => {
                if r.type_args.is_empty() {
                    r.path_string()
                } else {
                    let args = r
                        .type_args
                        .iter()
                        .map(|a| a.shortname())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}<{}>", r.path_string(), args)
                }
            }
            TypeKind::Generic(g) => g.name.as_str().to_string(),
            TypeKind::Union(u) => u
                .members
                .iter()
                .map(|m| m.shortname())
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Lock(l) => format!("lock<{}>", l.ret.shortname()),
            TypeKind::Namespace(ns) => format!("namespace {}", ns.decl.name),
            TypeKind::FfiNamespace(ns) => format!("extern {}", ns.decl.name),
            TypeKind::FfiMethod(m) => format!("extern fn {}.{}", m.parent, m.method.name),
            TypeKind::MetaClass(m) => format!("typeof({})", m.class.shortname()),
            TypeKind::MetaInterface(m) => format!("typeof({})", m.interface.shortname()),
            TypeKind::MetaVariant(m) => format!("typeof({})", m.variant.shortname()),
            TypeKind::MetaVariantConstructor(m) => {
                format!("typeof({})", m.constructor.shortname())
            }
            TypeKind::MetaEnum(m) => format!("typeof({})", m.enum_type.shortname()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shortname())
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use ternc_util::{Span, Symbol};

    fn sp() -> Span {
        Span::DUMMY
    }

    #[test]
    fn test_shortname_scalars() {
        assert_eq!(DataType::basic(BasicKind::U8, sp()).shortname(), "u8");
        assert_eq!(DataType::bool_type(sp()).shortname(), "bool");
        assert_eq!(DataType::void(sp()).shortname(), "void");
    }

    #[test]
    fn test_shortname_array_and_nullable() {
        let arr = DataType::array(DataType::basic(BasicKind::I64, sp()), sp());
        assert_eq!(arr.shortname(), "i64[]");
        let n = DataType::nullable(arr, sp());
        assert_eq!(n.shortname(), "i64[]?");
    }

    #[test]
    fn test_shortname_tuple() {
        let t = DataType::tuple(
            vec![
                DataType::basic(BasicKind::U8, sp()),
                DataType::bool_type(sp()),
            ],
            sp(),
        );
        assert_eq!(t.shortname(), "(u8, bool)");
    }

    #[test]
    fn test_shortname_function() {
        let f = DataType::function(
            vec![FunctionArgument::new(
                Symbol::intern("x"),
                DataType::basic(BasicKind::U32, sp()),
            )],
            DataType::void(sp()),
            sp(),
        );
        assert_eq!(f.shortname(), "fn(x: u32) -> void");
    }

    #[test]
    fn test_shortname_reference_with_args() {
        let r = DataType::reference(
            vec![Symbol::intern("Vec")],
            vec![DataType::basic(BasicKind::U32, sp())],
            sp(),
        );
        assert_eq!(r.shortname(), "Vec<u32>");
    }

    #[test]
    fn test_shortname_variant() {
        let leaf = DataType::variant_constructor(Symbol::intern("Leaf"), vec![], sp());
        let v = DataType::variant(vec![leaf], sp());
        assert_eq!(v.shortname(), "variant{Leaf}");
    }
}
