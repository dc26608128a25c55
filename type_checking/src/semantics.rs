//! Everything semantic analysis can report.
use crate::type_system::CheckedType;
use failure::Fail;
use strum_macros::Display;

#[derive(Debug, Fail)]
pub enum SemanticError {
    #[fail(display = "Variable '{}' not declared", name)]
    VariableNotDeclared { name: String },
    #[fail(
        display = "Type mismatch: cannot assign {} to {} in variable '{}'",
        from, to, name
    )]
    AssignmentTypeMismatch {
        name: String,
        from: CheckedType,
        to: CheckedType,
    },
    #[fail(
        display = "Type mismatch in initialization of '{}': cannot assign {} to {}",
        name, from, to
    )]
    InitializerTypeMismatch {
        name: String,
        from: CheckedType,
        to: CheckedType,
    },
    #[fail(
        display = "Relational operator '{}' requires numeric operands, got {} and {}",
        op, lhs, rhs
    )]
    RelationalOperandsNotNumeric {
        op: ast::BinaryOp,
        lhs: CheckedType,
        rhs: CheckedType,
    },
    #[fail(
        display = "Logical operator '{}' requires boolean operands, {} operand is {}",
        op, side, ty
    )]
    LogicalOperandNotBoolean {
        op: ast::BinaryOp,
        side: Side,
        ty: CheckedType,
    },
    #[fail(
        display = "Arithmetic operator '{}' requires numeric operands, {} operand is {}",
        op, side, ty
    )]
    ArithmeticOperandNotNumeric {
        op: ast::BinaryOp,
        side: Side,
        ty: CheckedType,
    },
    #[fail(display = "{} condition must be boolean, got {}", construct, ty)]
    ConditionNotBoolean {
        construct: ConditionKind,
        ty: CheckedType,
    },
    #[fail(display = "Return statement outside of method")]
    ReturnOutsideMethod,
    #[fail(display = "void method '{}' cannot return a value", method)]
    VoidMethodReturnsValue { method: String },
    #[fail(display = "Method '{}' must return a value of type '{}'", method, ty)]
    MissingReturnValue { method: String, ty: CheckedType },
    #[fail(
        display = "Incompatible return type. Expected '{}' but got '{}' in method '{}'",
        expected, actual, method
    )]
    IncompatibleReturnType {
        method: String,
        expected: CheckedType,
        actual: CheckedType,
    },
    #[fail(
        display = "Method '{}' expects {} argument(s) but got {}",
        method, expected, actual
    )]
    MethodArgCountMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[fail(
        display = "Argument {} of method '{}': expected '{}' but got '{}'",
        position, method, expected, actual
    )]
    ArgumentTypeMismatch {
        /// 1-based
        position: usize,
        method: String,
        expected: CheckedType,
        actual: CheckedType,
    },
    #[fail(display = "Method '{}' already declared at line {}", name, first_line)]
    MethodAlreadyDeclared { name: String, first_line: usize },
}

#[derive(Debug, Fail)]
pub enum SemanticWarning {
    #[fail(
        display = "Cannot determine type of expression in assignment to '{}'",
        name
    )]
    UnknownAssignmentType { name: String },
    #[fail(display = "Cannot determine type of {} condition", construct)]
    UnknownConditionType { construct: ConditionKind },
    #[fail(display = "Cannot determine type of return expression")]
    UnknownReturnType,
    #[fail(
        display = "Cannot determine type of argument {} in call to '{}'",
        position, method
    )]
    UnknownArgumentType { position: usize, method: String },
    #[fail(display = "Method '{}' not found or not yet declared", name)]
    MethodNotFound { name: String },
    #[fail(display = "Comparing incompatible types: {} and {}", lhs, rhs)]
    ComparingIncompatibleTypes { lhs: CheckedType, rhs: CheckedType },
    #[fail(display = "Error analyzing node: {}", reason)]
    AnalysisFailed { reason: AnalysisFailure },
}

/// Unexpected conditions that abort the analysis of a single node.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum AnalysisFailure {
    #[fail(display = "nesting deeper than {} levels", limit)]
    NestingTooDeep { limit: usize },
    #[fail(display = "cannot leave the global scope")]
    ScopeUnderflow,
    #[fail(display = "no local variable environment for method '{}'", method)]
    MissingLocalEnvironment { method: String },
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "right")]
    Right,
}

/// The construct a checked condition belongs to.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "while")]
    While,
    #[strum(serialize = "do-while")]
    DoWhile,
    #[strum(serialize = "for")]
    For,
}
