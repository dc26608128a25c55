use crate::{checker::TypeChecker, type_system::*};
use ast::{Expr, UnaryOp};

impl<'st> TypeChecker<'st> {
    /// Infers the static type of `expr` without reporting anything.
    ///
    /// Calls and member accesses are not resolved and always have an
    /// unknown type.
    pub fn expression_type(&self, expr: &Expr) -> CheckedType {
        use ast::Expr::*;
        match expr {
            Literal { ty, .. } => CheckedType::from_name(ty),
            Identifier(name) => self
                .resolve_variable(name)
                .unwrap_or(CheckedType::Unknown),
            Binary { op, lhs, rhs } => {
                if op.yields_boolean() {
                    PrimitiveType::Boolean.into()
                } else {
                    wider(&self.expression_type(lhs), &self.expression_type(rhs))
                }
            }
            Unary {
                op: UnaryOp::Not, ..
            } => PrimitiveType::Boolean.into(),
            Unary { operand, .. } => self.expression_type(operand),
            MethodCall(_) | MemberAccess { .. } => CheckedType::Unknown,
        }
    }
}
