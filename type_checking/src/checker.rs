use crate::{semantics::*, type_system::*};
use ast::{BinaryOp, Expr, OperatorKind, Spanned};
use diagnostics::Diagnostics;
use std::{collections::HashMap, io, rc::Rc};
use symtab::SymbolTable;
use termcolor::WriteColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Register every method signature before any body is analyzed, so calls
    /// to methods declared further down resolve.
    pub resolve_forward_calls: bool,
    /// Statements and expressions nested deeper than this are not analyzed.
    pub max_nesting_depth: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            resolve_forward_calls: false,
            max_nesting_depth: 256,
        }
    }
}

/// Parameters and locals of one method, by name.
pub type LocalEnv = HashMap<String, CheckedType>;

/// The method whose body is being analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodContext {
    pub name: String,
    pub return_ty: CheckedType,
}

/// One analysis session.
///
/// The checker borrows the symbol table for the whole session: declared
/// locals and parameters are added to it and every variable use is marked,
/// so the caller can ask the table for unused variables afterwards.
///
/// Diagnostics accumulate. Analyzing the same program twice with one checker
/// reports everything twice, use a fresh checker per run.
pub struct TypeChecker<'st> {
    pub(crate) symtab: &'st mut SymbolTable,
    pub(crate) signatures: SignatureCatalogue,
    pub(crate) local_vars: HashMap<String, LocalEnv>,
    pub(crate) current_method: Option<MethodContext>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) options: CheckerOptions,
    pub(crate) depth: usize,
}

impl<'st> TypeChecker<'st> {
    pub fn new(symtab: &'st mut SymbolTable) -> Self {
        Self::with_options(symtab, CheckerOptions::default())
    }

    pub fn with_options(symtab: &'st mut SymbolTable, options: CheckerOptions) -> Self {
        TypeChecker {
            symtab,
            signatures: SignatureCatalogue::default(),
            local_vars: HashMap::new(),
            current_method: None,
            diagnostics: Diagnostics::new(),
            options,
            depth: 0,
        }
    }

    pub(crate) fn report_error(&mut self, line: usize, error: SemanticError) {
        self.diagnostics.error(Some(line), error)
    }

    pub(crate) fn report_warning(&mut self, line: usize, warning: SemanticWarning) {
        self.diagnostics.warning(Some(line), warning)
    }

    /// The current method's locals shadow the symbol table.
    pub(crate) fn resolve_variable(&self, name: &str) -> Option<CheckedType> {
        self.current_method
            .as_ref()
            .and_then(|method| self.local_vars.get(&method.name))
            .and_then(|env| env.get(name))
            .cloned()
            .or_else(|| {
                self.symtab
                    .lookup_variable(name)
                    .map(|info| CheckedType::from_name(&info.ty))
            })
    }

    pub fn check_assignment(&mut self, name: &str, value: &Expr, line: usize) {
        let var_ty = match self.resolve_variable(name) {
            Some(ty) => ty,
            None => {
                self.report_error(
                    line,
                    SemanticError::VariableNotDeclared {
                        name: name.to_string(),
                    },
                );
                return;
            }
        };

        let value_ty = self.expression_type(value);
        if value_ty.is_unknown() {
            self.report_warning(
                line,
                SemanticWarning::UnknownAssignmentType {
                    name: name.to_string(),
                },
            );
            return;
        }

        if !is_assignment_compatible(&value_ty, &var_ty) {
            self.report_error(
                line,
                SemanticError::AssignmentTypeMismatch {
                    name: name.to_string(),
                    from: value_ty,
                    to: var_ty,
                },
            );
        }
    }

    /// An initializer of unknown type is accepted silently.
    pub(crate) fn check_initializer(
        &mut self,
        name: &str,
        declared: &CheckedType,
        init: &Expr,
        line: usize,
    ) {
        let init_ty = self.expression_type(init);
        if !init_ty.is_unknown() && !is_assignment_compatible(&init_ty, declared) {
            self.report_error(
                line,
                SemanticError::InitializerTypeMismatch {
                    name: name.to_string(),
                    from: init_ty,
                    to: declared.clone(),
                },
            );
        }
    }

    /// Nothing is reported if the type of either operand is unknown.
    pub fn check_binary_operation(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, line: usize) {
        let lhs_ty = self.expression_type(lhs);
        let rhs_ty = self.expression_type(rhs);

        if lhs_ty.is_unknown() || rhs_ty.is_unknown() {
            return;
        }

        match op.kind() {
            OperatorKind::Relational => {
                if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                    self.report_error(
                        line,
                        SemanticError::RelationalOperandsNotNumeric {
                            op,
                            lhs: lhs_ty,
                            rhs: rhs_ty,
                        },
                    );
                }
            }
            OperatorKind::Equality => {
                if !is_assignment_compatible(&lhs_ty, &rhs_ty)
                    && !is_assignment_compatible(&rhs_ty, &lhs_ty)
                {
                    self.report_warning(
                        line,
                        SemanticWarning::ComparingIncompatibleTypes {
                            lhs: lhs_ty,
                            rhs: rhs_ty,
                        },
                    );
                }
            }
            OperatorKind::Logical => {
                for (side, ty) in vec![(Side::Left, lhs_ty), (Side::Right, rhs_ty)] {
                    if !ty.is_boolean() {
                        self.report_error(
                            line,
                            SemanticError::LogicalOperandNotBoolean { op, side, ty },
                        );
                    }
                }
            }
            OperatorKind::Arithmetic => {
                // `+` on strings is concatenation, the other operators get
                // the same leniency
                for (side, ty) in vec![(Side::Left, lhs_ty), (Side::Right, rhs_ty)] {
                    if !ty.is_numeric() && !ty.is_string() {
                        self.report_error(
                            line,
                            SemanticError::ArithmeticOperandNotNumeric { op, side, ty },
                        );
                    }
                }
            }
            OperatorKind::Bitwise => {}
        }
    }

    pub fn check_condition(&mut self, cond: &Expr, construct: ConditionKind, line: usize) {
        let ty = self.expression_type(cond);

        if ty.is_unknown() {
            self.report_warning(line, SemanticWarning::UnknownConditionType { construct });
        } else if !ty.is_boolean() {
            self.report_error(line, SemanticError::ConditionNotBoolean { construct, ty });
        }
    }

    pub fn check_return_statement(&mut self, value: Option<&Expr>, line: usize) {
        let method = match &self.current_method {
            Some(method) => method.clone(),
            None => {
                self.report_error(line, SemanticError::ReturnOutsideMethod);
                return;
            }
        };

        let returns_void = method.return_ty == CheckedType::Void;
        let value = match (value, returns_void) {
            (Some(_), true) => {
                self.report_error(
                    line,
                    SemanticError::VoidMethodReturnsValue {
                        method: method.name,
                    },
                );
                return;
            }
            (None, true) => return,
            (None, false) => {
                self.report_error(
                    line,
                    SemanticError::MissingReturnValue {
                        method: method.name,
                        ty: method.return_ty,
                    },
                );
                return;
            }
            (Some(value), false) => value,
        };

        let value_ty = self.expression_type(value);
        if value_ty.is_unknown() {
            self.report_warning(line, SemanticWarning::UnknownReturnType);
        } else if !is_assignment_compatible(&value_ty, &method.return_ty) {
            self.report_error(
                line,
                SemanticError::IncompatibleReturnType {
                    method: method.name,
                    expected: method.return_ty,
                    actual: value_ty,
                },
            );
        }
    }

    /// An arity mismatch is reported once, the arguments are not checked
    /// individually then.
    pub fn check_method_call(&mut self, name: &str, args: &[Spanned<Expr>], line: usize) {
        let signature = match self.signatures.method(name) {
            Some(signature) => signature,
            None => {
                self.report_warning(
                    line,
                    SemanticWarning::MethodNotFound {
                        name: name.to_string(),
                    },
                );
                return;
            }
        };

        if signature.params.len() != args.len() {
            self.report_error(
                line,
                SemanticError::MethodArgCountMismatch {
                    method: name.to_string(),
                    expected: signature.params.len(),
                    actual: args.len(),
                },
            );
            return;
        }

        for (idx, (param, arg)) in signature.params.iter().zip(args).enumerate() {
            let arg_ty = self.expression_type(arg);
            if arg_ty.is_unknown() {
                self.report_warning(
                    line,
                    SemanticWarning::UnknownArgumentType {
                        position: idx + 1,
                        method: name.to_string(),
                    },
                );
            } else if !is_assignment_compatible(&arg_ty, &param.ty) {
                self.report_error(
                    line,
                    SemanticError::ArgumentTypeMismatch {
                        position: idx + 1,
                        method: name.to_string(),
                        expected: param.ty.clone(),
                        actual: arg_ty,
                    },
                );
            }
        }
    }

    /// Adds a signature to the catalogue. A second method of the same name is
    /// reported and the first one is kept.
    pub fn register_method(
        &mut self,
        name: &str,
        return_ty: &str,
        params: Vec<MethodParamDef>,
        line: usize,
    ) {
        log::debug!("Registering method '{}' declared at line {}", name, line);

        let signature = MethodSignature {
            name: name.to_string(),
            return_ty: CheckedType::from_name(return_ty),
            params,
            line,
        };

        if let Err(MethodAlreadyDeclared { line: first_line }) =
            self.signatures.add_method(signature)
        {
            self.report_error(
                line,
                SemanticError::MethodAlreadyDeclared {
                    name: name.to_string(),
                    first_line,
                },
            );
        }
    }

    pub fn enter_method(&mut self, name: &str, return_ty: &str) {
        log::debug!("Entering method '{}'", name);
        self.current_method = Some(MethodContext {
            name: name.to_string(),
            return_ty: CheckedType::from_name(return_ty),
        });
    }

    pub fn exit_method(&mut self) {
        if let Some(method) = self.current_method.take() {
            log::debug!("Leaving method '{}'", method.name);
        }
    }

    /// Runs `f` in the context of the given method. The context is left
    /// afterwards, whatever `f` returns.
    pub fn with_method<F, R>(&mut self, name: &str, return_ty: &str, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.enter_method(name, return_ty);
        let result = f(self);
        self.exit_method();
        result
    }

    pub fn errors(&self) -> Vec<String> {
        self.diagnostics.errors().map(|msg| msg.to_string()).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics.warnings().map(|msg| msg.to_string()).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.errored()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn signature(&self, name: &str) -> Option<Rc<MethodSignature>> {
        self.signatures.method(name)
    }

    pub fn local_variables(&self, method: &str) -> Option<&LocalEnv> {
        self.local_vars.get(method)
    }

    pub fn current_method(&self) -> Option<&MethodContext> {
        self.current_method.as_ref()
    }

    pub fn symtab(&self) -> &SymbolTable {
        &*self.symtab
    }

    pub fn write_report(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        self.diagnostics.write_report(writer)
    }
}
