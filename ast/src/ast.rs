//! The abstract syntax tree handed to semantic analysis.
//!
//! The tree is produced by an external parser and is never mutated after
//! construction. Every node is wrapped in a [`Spanned`] that records where
//! the node starts in the source. Children are owned exclusively by their
//! parent, there are no back-edges and no shared subtrees.
//!
//! All types implement serde's `Serialize`/`Deserialize`, which is how a
//! parser living in another process hands a finished tree over.
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use strum_macros::{Display, EnumDiscriminants, EnumString};

/// A 1-based source position.
#[derive(
    derive_more::Display,
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}:{}", line, column)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// Attaches the source position of a node to its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub pos: Position,
    pub data: T,
}

impl<T> Spanned<T> {
    pub fn new(pos: Position, data: T) -> Self {
        Spanned { pos, data }
    }

    pub fn at(line: usize, column: usize, data: T) -> Self {
        Spanned::new(Position::new(line, column), data)
    }

    pub fn line(&self) -> usize {
        self.pos.line
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// This is the top-level AST node. It stores all class declarations of the
/// program in source order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<Spanned<ClassDeclaration>>,
}

/// A class declaration: its name, the raw modifier text (e.g. `"public"`)
/// and its members in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    pub modifiers: String,
    pub members: Vec<Spanned<ClassMember>>,
}

/// A class member is either one of
/// * `Field`: a field declaration
/// * `Method`: a method declaration including its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassMember {
    Field(FieldDeclaration),
    Method(MethodDeclaration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub modifiers: String,
    pub ty: String,
    pub name: String,
    pub is_array: bool,
}

/// A method declaration. `return_ty` is the textual type name and may be
/// `"void"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub modifiers: String,
    pub return_ty: String,
    pub name: String,
    pub params: Vec<Spanned<Parameter>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
    pub is_array: bool,
}

/// A `Block` is an ordered list of statements that opens a new scope.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Spanned<Stmt>>,
}

/// One `case <value>:` arm of a switch with the statements that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub value: Spanned<Expr>,
    pub body: Vec<Spanned<Stmt>>,
}

/// A statement can have one of the kinds:
/// * `VariableDeclaration`: a local variable with an optional initializer
/// * `Assignment`: assigns an expression to a named variable
/// * `If`: condition, then-branch and optional else-branch
/// * `While`, `DoWhile`: loops with a condition
/// * `For`: a loop whose init, condition and update are all optional
/// * `Switch`: a scrutinee, its case arms and an optional default arm
/// * `Return`: returns an optional value
/// * `Break`, `Continue`
/// * `Block`: a nested block
/// * `Expression`: an expression evaluated for its effect, e.g. `foo(1);`
#[derive(EnumDiscriminants, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[strum_discriminants(name(StmtKind), derive(Display))]
pub enum Stmt {
    VariableDeclaration {
        ty: String,
        name: String,
        is_array: bool,
        init: Option<Box<Spanned<Expr>>>,
    },
    Assignment {
        target: String,
        value: Box<Spanned<Expr>>,
    },
    If {
        cond: Box<Spanned<Expr>>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: Box<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        cond: Box<Spanned<Expr>>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<Box<Spanned<Expr>>>,
        update: Option<Box<Spanned<Stmt>>>,
        body: Box<Spanned<Stmt>>,
    },
    Switch {
        scrutinee: Box<Spanned<Expr>>,
        cases: Vec<Spanned<Case>>,
        default: Option<Spanned<Block>>,
    },
    Return(Option<Box<Spanned<Expr>>>),
    Break,
    Continue,
    Block(Block),
    Expression(Box<Spanned<Expr>>),
}

/// A call `name(args...)`, either free-standing or at the end of a member
/// access chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<Spanned<Expr>>,
}

/// An expression is either one of
/// * `Literal`: a literal value together with its type tag, e.g. `int`
/// * `Identifier`: use of a variable
/// * `Binary`: one of the operations defined in `BinaryOp`
/// * `Unary`: one of the operations defined in `UnaryOp`, prefix or postfix
/// * `MethodCall`: a call of a method of the current class
/// * `MemberAccess`: a dotted path like `a.b.c`, optionally ending in a call
///   `a.b.c(args)`
#[derive(EnumDiscriminants, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[strum_discriminants(name(ExprKind), derive(Display))]
pub enum Expr {
    Literal {
        ty: String,
        value: String,
    },
    Identifier(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
        prefix: bool,
    },
    MethodCall(MethodCall),
    MemberAccess {
        path: Vec<String>,
        call: Option<MethodCall>,
    },
}

/// Binary operations: comparisons (`==`, `<=`, ...), logical operations
/// (`||`, `&&`), arithmetic (`+`, `-`, `*`, `/`, `%`) and the bitwise and
/// shift operators.
#[derive(
    Display, EnumString, Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize,
)]
pub enum BinaryOp {
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Equals,
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    NotEquals,
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    LessThan,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    LessEquals,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    GreaterEquals,

    #[strum(serialize = "&&")]
    #[serde(rename = "&&")]
    LogicalAnd,
    #[strum(serialize = "||")]
    #[serde(rename = "||")]
    LogicalOr,

    #[strum(serialize = "+")]
    #[serde(rename = "+")]
    Add,
    #[strum(serialize = "-")]
    #[serde(rename = "-")]
    Sub,
    #[strum(serialize = "*")]
    #[serde(rename = "*")]
    Mul,
    #[strum(serialize = "/")]
    #[serde(rename = "/")]
    Div,
    #[strum(serialize = "%")]
    #[serde(rename = "%")]
    Mod,

    #[strum(serialize = "&")]
    #[serde(rename = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    #[serde(rename = "|")]
    BitOr,
    #[strum(serialize = "^")]
    #[serde(rename = "^")]
    BitXor,
    #[strum(serialize = "<<")]
    #[serde(rename = "<<")]
    ShiftLeft,
    #[strum(serialize = ">>")]
    #[serde(rename = ">>")]
    ShiftRight,
}

/// Operator families that share one typing rule.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperatorKind {
    Equality,
    Relational,
    Logical,
    Arithmetic,
    Bitwise,
}

impl BinaryOp {
    pub fn kind(self) -> OperatorKind {
        use self::BinaryOp::*;
        match self {
            Equals | NotEquals => OperatorKind::Equality,
            LessThan | GreaterThan | LessEquals | GreaterEquals => OperatorKind::Relational,
            LogicalAnd | LogicalOr => OperatorKind::Logical,
            Add | Sub | Mul | Div | Mod => OperatorKind::Arithmetic,
            BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight => OperatorKind::Bitwise,
        }
    }

    /// Equality, relational and logical operators always yield `boolean`.
    pub fn yields_boolean(self) -> bool {
        match self.kind() {
            OperatorKind::Equality | OperatorKind::Relational | OperatorKind::Logical => true,
            OperatorKind::Arithmetic | OperatorKind::Bitwise => false,
        }
    }
}

/// One of the unary operations `!`, `-`, `+`, `++`, `--` and `~`.
#[derive(
    Display, EnumString, Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize,
)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    #[serde(rename = "!")]
    Not,
    #[strum(serialize = "-")]
    #[serde(rename = "-")]
    Neg,
    #[strum(serialize = "+")]
    #[serde(rename = "+")]
    Plus,
    #[strum(serialize = "++")]
    #[serde(rename = "++")]
    Increment,
    #[strum(serialize = "--")]
    #[serde(rename = "--")]
    Decrement,
    #[strum(serialize = "~")]
    #[serde(rename = "~")]
    BitNot,
}

impl Expr {
    pub fn literal(ty: &str, value: &str) -> Self {
        Expr::Literal {
            ty: ty.to_string(),
            value: value.to_string(),
        }
    }

    pub fn ident(name: &str) -> Self {
        Expr::Identifier(name.to_string())
    }

    pub fn binary(op: BinaryOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Spanned<Expr>, prefix: bool) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            prefix,
        }
    }

    pub fn call(name: &str, args: Vec<Spanned<Expr>>) -> Self {
        Expr::MethodCall(MethodCall {
            name: name.to_string(),
            args,
        })
    }

    pub fn member_access(path: &[&str], call: Option<MethodCall>) -> Self {
        Expr::MemberAccess {
            path: path.iter().map(|segment| segment.to_string()).collect(),
            call,
        }
    }
}

impl Stmt {
    pub fn declare(ty: &str, name: &str, init: Option<Spanned<Expr>>) -> Self {
        Stmt::VariableDeclaration {
            ty: ty.to_string(),
            name: name.to_string(),
            is_array: false,
            init: init.map(Box::new),
        }
    }

    pub fn assign(target: &str, value: Spanned<Expr>) -> Self {
        Stmt::Assignment {
            target: target.to_string(),
            value: Box::new(value),
        }
    }

    pub fn ret(value: Option<Spanned<Expr>>) -> Self {
        Stmt::Return(value.map(Box::new))
    }

    pub fn expr(expr: Spanned<Expr>) -> Self {
        Stmt::Expression(Box::new(expr))
    }
}

impl Parameter {
    pub fn new(ty: &str, name: &str) -> Self {
        Parameter {
            ty: ty.to_string(),
            name: name.to_string(),
            is_array: false,
        }
    }
}

impl MethodDeclaration {
    pub fn new(
        return_ty: &str,
        name: &str,
        params: Vec<Spanned<Parameter>>,
        body: Vec<Spanned<Stmt>>,
    ) -> Self {
        MethodDeclaration {
            modifiers: String::new(),
            return_ty: return_ty.to_string(),
            name: name.to_string(),
            params,
            body,
        }
    }
}

impl FieldDeclaration {
    pub fn new(ty: &str, name: &str) -> Self {
        FieldDeclaration {
            modifiers: String::new(),
            ty: ty.to_string(),
            name: name.to_string(),
            is_array: false,
        }
    }
}

impl ClassDeclaration {
    pub fn new(name: &str, members: Vec<Spanned<ClassMember>>) -> Self {
        ClassDeclaration {
            name: name.to_string(),
            modifiers: String::new(),
            members,
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = (&Spanned<ClassMember>, &MethodDeclaration)> {
        self.members.iter().filter_map(|member| match &member.data {
            ClassMember::Method(method) => Some((member, method)),
            ClassMember::Field(_) => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Spanned<ClassMember>, &FieldDeclaration)> {
        self.members.iter().filter_map(|member| match &member.data {
            ClassMember::Field(field) => Some((member, field)),
            ClassMember::Method(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use utils::assert_matches;

    #[test]
    fn operators_parse_from_their_symbols() {
        assert_eq!(BinaryOp::from_str("<=").unwrap(), BinaryOp::LessEquals);
        assert_eq!(BinaryOp::from_str("&&").unwrap(), BinaryOp::LogicalAnd);
        assert_eq!(UnaryOp::from_str("++").unwrap(), UnaryOp::Increment);
        assert_matches!(BinaryOp::from_str("<>"), Err(_));
        assert_eq!(BinaryOp::Mod.to_string(), "%");
    }

    #[test]
    fn operator_families() {
        assert_eq!(BinaryOp::NotEquals.kind(), OperatorKind::Equality);
        assert_eq!(BinaryOp::GreaterThan.kind(), OperatorKind::Relational);
        assert_eq!(BinaryOp::LogicalOr.kind(), OperatorKind::Logical);
        assert_eq!(BinaryOp::Div.kind(), OperatorKind::Arithmetic);
        assert_eq!(BinaryOp::ShiftLeft.kind(), OperatorKind::Bitwise);
        assert!(BinaryOp::LessThan.yields_boolean());
        assert!(!BinaryOp::BitXor.yields_boolean());
    }

    #[test]
    fn spanned_derefs_to_data() {
        let expr = Spanned::at(4, 9, Expr::ident("x"));
        assert_eq!(expr.line(), 4);
        assert_eq!(expr.pos.to_string(), "4:9");
        assert_eq!(*expr, Expr::ident("x"));
        assert_matches!(&*expr, Expr::Identifier(_));
    }

    #[test]
    fn kinds_name_the_variant() {
        let stmt = Stmt::ret(None);
        assert_eq!(StmtKind::from(&stmt).to_string(), "Return");
        let expr = Expr::call("foo", vec![]);
        assert_eq!(ExprKind::from(&expr).to_string(), "MethodCall");
    }

    #[test]
    fn json_uses_operator_symbols() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Spanned::at(1, 1, Expr::literal("int", "1")),
            Spanned::at(1, 5, Expr::ident("y")),
        );
        let json = serde_json::to_string(&expr).unwrap();
        assert!(json.contains(r#""op":"+""#), "{}", json);
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn class_splits_members() {
        let class = ClassDeclaration::new(
            "Main",
            vec![
                Spanned::at(2, 5, ClassMember::Field(FieldDeclaration::new("int", "count"))),
                Spanned::at(
                    3,
                    5,
                    ClassMember::Method(MethodDeclaration::new("void", "run", vec![], vec![])),
                ),
            ],
        );
        assert_eq!(class.fields().count(), 1);
        let names: Vec<_> = class.methods().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(names, vec!["run"]);
    }
}
