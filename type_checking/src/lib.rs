//! Static type checking of method bodies.
//!
//! A [`TypeChecker`] walks a finished [`ast::Program`] once, resolving
//! variables through the per-method local environments and the shared
//! [`symtab::SymbolTable`], and records every problem it finds as an error or
//! a warning. Analysis never aborts: problems are collected and the walk goes
//! on with the next node.

pub mod checker;
mod expr_typechecker;
mod method_body_type_checker;
pub mod semantics;
pub mod type_system;

pub use self::{
    checker::{CheckerOptions, LocalEnv, MethodContext, TypeChecker},
    type_system::{is_assignment_compatible, wider, CheckedType, PrimitiveType},
};
