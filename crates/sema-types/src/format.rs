//! Human-readable type rendering for diagnostics.
//!
//! `List<String>?`, platform types as `String!`, `dynamic`, function types
//! as `(Int) -> String`.

use crate::env::TypeEnvironment;
use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    env: &'a dyn TypeEnvironment,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner, env: &'a dyn TypeEnvironment) -> Self {
        TypeFormatter { interner, env }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write(&mut out, ty);
        out
    }

    pub fn format_list(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|&t| self.format(t))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn write(&self, out: &mut String, ty: TypeId) {
        match self.interner.lookup(ty) {
            TypeData::Error => out.push_str("[ERROR]"),
            TypeData::Nothing { nullable } => {
                out.push_str("Nothing");
                if nullable {
                    out.push('?');
                }
            }
            TypeData::Class {
                def,
                args,
                nullable,
            } => {
                out.push_str(&self.env.name_of(def));
                if !args.is_empty() {
                    out.push('<');
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(out, arg);
                    }
                    out.push('>');
                }
                if nullable {
                    out.push('?');
                }
            }
            TypeData::TypeParam { def, nullable } => {
                out.push_str(&self.env.name_of(def));
                if nullable {
                    out.push('?');
                }
            }
            TypeData::Flexible { lower, upper } => {
                if lower == TypeId::NOTHING {
                    out.push_str("dynamic");
                } else if upper == self.interner.make_nullable(lower) {
                    self.write(out, lower);
                    out.push('!');
                } else {
                    out.push('(');
                    self.write(out, lower);
                    out.push_str("..");
                    self.write(out, upper);
                    out.push(')');
                }
            }
            TypeData::Function {
                params,
                ret,
                nullable,
            } => {
                if nullable {
                    out.push('(');
                }
                out.push('(');
                for (i, &param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(out, param);
                }
                out.push_str(") -> ");
                self.write(out, ret);
                if nullable {
                    out.push_str(")?");
                }
            }
            TypeData::Infer { var, nullable } => {
                out.push_str(&format!("?{}", var.0));
                if nullable {
                    out.push('?');
                }
            }
        }
    }
}
