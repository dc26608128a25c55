//! The single depth-first walk over a program.
//!
//! Every statement and expression is visited behind a boundary: an
//! [`AnalysisFailure`] raised while analyzing a node is downgraded to a
//! warning and the walk continues with the node's next sibling.
use crate::{checker::*, semantics::*, type_system::*};
use ast::{
    ClassDeclaration, Expr, ExprKind, MethodDeclaration, Program, Spanned, Stmt, StmtKind,
};

impl<'st> TypeChecker<'st> {
    /// Analyzes all classes of `program` in source order. Fields are skipped,
    /// the caller is expected to declare them in the symbol table beforehand.
    pub fn analyze(&mut self, program: &Program) {
        log::info!("Analyzing {} class(es)", program.classes.len());

        if self.options.resolve_forward_calls {
            self.register_signatures(program);
        }

        for class in &program.classes {
            self.analyze_class(class);
        }

        log::info!(
            "Analysis finished with {} error(s) and {} warning(s)",
            self.diagnostics.count(diagnostics::MessageLevel::Error),
            self.diagnostics.count(diagnostics::MessageLevel::Warning)
        );
    }

    fn register_signatures(&mut self, program: &Program) {
        for class in &program.classes {
            for (member, method) in class.methods() {
                self.register_method(
                    &method.name,
                    &method.return_ty,
                    param_defs(method),
                    member.line(),
                );
            }
        }
    }

    fn analyze_class(&mut self, class: &Spanned<ClassDeclaration>) {
        log::debug!("Analyzing class '{}' at {}", class.name, class.pos);

        for (member, method) in class.methods() {
            let line = member.line();
            self.visit(|checker| checker.analyze_method(method, line));
        }
    }

    fn analyze_method(
        &mut self,
        method: &MethodDeclaration,
        line: usize,
    ) -> Result<(), AnalysisFailure> {
        let params = param_defs(method);
        let env: LocalEnv = params
            .iter()
            .map(|param| (param.name.clone(), param.ty.clone()))
            .collect();
        self.local_vars.insert(method.name.clone(), env);

        if !self.options.resolve_forward_calls {
            self.register_method(&method.name, &method.return_ty, params, line);
        }

        self.with_method(&method.name, &method.return_ty, |checker| {
            checker.symtab.enter_scope();
            for param in &method.params {
                checker
                    .symtab
                    .add_variable(&param.name, &param.ty, param.line());
            }
            for stmt in &method.body {
                checker.visit_stmt(stmt);
            }
            checker.leave_scope()
        })
    }

    /// Runs `analyze` one nesting level deeper. A failure is reported as a
    /// warning without a line.
    fn visit<F>(&mut self, analyze: F)
    where
        F: FnOnce(&mut Self) -> Result<(), AnalysisFailure>,
    {
        self.depth += 1;
        let result = if self.depth > self.options.max_nesting_depth {
            Err(AnalysisFailure::NestingTooDeep {
                limit: self.options.max_nesting_depth,
            })
        } else {
            analyze(self)
        };
        self.depth -= 1;

        if let Err(reason) = result {
            log::debug!("Analysis of a node failed: {}", reason);
            self.diagnostics
                .warning(None, SemanticWarning::AnalysisFailed { reason });
        }
    }

    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        self.visit(|checker| checker.analyze_stmt(stmt))
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        self.visit(|checker| checker.analyze_expr(expr))
    }

    fn leave_scope(&mut self) -> Result<(), AnalysisFailure> {
        self.symtab
            .leave_scope()
            .map_err(|_| AnalysisFailure::ScopeUnderflow)
    }

    /// Records a local in the current method's environment and the innermost
    /// scope of the symbol table.
    fn declare_local(&mut self, name: &str, ty: &str, line: usize) -> Result<(), AnalysisFailure> {
        if let Some(method) = &self.current_method {
            let env = self.local_vars.get_mut(&method.name).ok_or_else(|| {
                AnalysisFailure::MissingLocalEnvironment {
                    method: method.name.clone(),
                }
            })?;
            env.insert(name.to_string(), CheckedType::from_name(ty));
        }
        self.symtab.add_variable(name, ty, line);
        Ok(())
    }

    fn analyze_block(&mut self, statements: &[Spanned<Stmt>]) -> Result<(), AnalysisFailure> {
        self.symtab.enter_scope();
        for stmt in statements {
            self.visit_stmt(stmt);
        }
        self.leave_scope()
    }

    fn analyze_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), AnalysisFailure> {
        log::trace!("{} at {}", StmtKind::from(&stmt.data), stmt.pos);

        let line = stmt.line();
        match &stmt.data {
            Stmt::VariableDeclaration { ty, name, init, .. } => {
                // declared before the initializer is looked at, so `int x = x;`
                // resolves `x`
                self.declare_local(name, ty, line)?;
                if let Some(init) = init {
                    self.check_initializer(name, &CheckedType::from_name(ty), init, line);
                    self.visit_expr(init);
                }
            }
            Stmt::Assignment { target, value } => {
                self.check_assignment(target, value, line);
                self.visit_expr(value);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, ConditionKind::If, line);
                self.visit_expr(cond);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.check_condition(cond, ConditionKind::While, line);
                self.visit_expr(cond);
                self.visit_stmt(body);
            }
            Stmt::DoWhile { body, cond } => {
                self.visit_stmt(body);
                self.check_condition(cond, ConditionKind::DoWhile, line);
                self.visit_expr(cond);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.symtab.enter_scope();
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, ConditionKind::For, line);
                    self.visit_expr(cond);
                }
                if let Some(update) = update {
                    self.visit_stmt(update);
                }
                self.visit_stmt(body);
                self.leave_scope()?;
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
            } => {
                self.visit_expr(scrutinee);
                for case in cases {
                    self.visit_expr(&case.value);
                    self.analyze_block(&case.body)?;
                }
                if let Some(default) = default {
                    self.analyze_block(&default.statements)?;
                }
            }
            Stmt::Return(value) => {
                self.check_return_statement(value.as_ref().map(|value| &value.data), line);
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
            Stmt::Break | Stmt::Continue => {}
            Stmt::Block(block) => self.analyze_block(&block.statements)?,
            Stmt::Expression(expr) => self.visit_expr(expr),
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &Spanned<Expr>) -> Result<(), AnalysisFailure> {
        log::trace!("{} at {}", ExprKind::from(&expr.data), expr.pos);

        match &expr.data {
            Expr::Literal { .. } => {}
            Expr::Identifier(name) => self.symtab.mark_variable_used(name),
            Expr::Binary { op, lhs, rhs } => {
                self.check_binary_operation(*op, lhs, rhs, expr.line());
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::MethodCall(call) => {
                self.check_method_call(&call.name, &call.args, expr.line());
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::MemberAccess { path, call } => {
                // members of other objects are not resolved, only the
                // variable the path starts at counts as used
                if let Some(head) = path.first() {
                    self.symtab.mark_variable_used(head);
                }
                if let Some(call) = call {
                    for arg in &call.args {
                        self.visit_expr(arg);
                    }
                }
            }
        }
        Ok(())
    }
}

fn param_defs(method: &MethodDeclaration) -> Vec<MethodParamDef> {
    method
        .params
        .iter()
        .map(|param| MethodParamDef::from(&param.data))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{Block, ClassMember};
    use symtab::SymbolTable;

    fn program(methods: Vec<MethodDeclaration>) -> Program {
        let members = methods
            .into_iter()
            .enumerate()
            .map(|(idx, method)| Spanned::at(idx * 10 + 1, 5, ClassMember::Method(method)))
            .collect();
        Program {
            classes: vec![Spanned::at(1, 1, ClassDeclaration::new("Main", members))],
        }
    }

    fn nested_blocks(depth: usize) -> Spanned<Stmt> {
        let mut stmt = Spanned::at(2, 1, Stmt::Break);
        for _ in 0..depth {
            stmt = Spanned::at(
                2,
                1,
                Stmt::Block(Block {
                    statements: vec![stmt],
                }),
            );
        }
        stmt
    }

    #[test]
    fn nesting_limit_is_reported_once() {
        let mut symtab = SymbolTable::new();
        let options = CheckerOptions {
            max_nesting_depth: 4,
            ..CheckerOptions::default()
        };
        let mut checker = TypeChecker::with_options(&mut symtab, options);

        let method = MethodDeclaration::new("void", "deep", vec![], vec![nested_blocks(10)]);
        checker.analyze(&program(vec![method]));

        assert!(!checker.has_errors());
        assert_eq!(
            checker.warnings(),
            vec!["Error analyzing node: nesting deeper than 4 levels"]
        );
        assert_eq!(checker.depth, 0);
        assert_eq!(checker.symtab().scope_depth(), 0);
    }

    #[test]
    fn scopes_are_balanced_after_analysis() {
        let mut symtab = SymbolTable::new();
        let mut checker = TypeChecker::new(&mut symtab);

        let body = vec![
            Spanned::at(2, 9, Stmt::declare("int", "i", None)),
            nested_blocks(3),
            Spanned::at(
                4,
                9,
                Stmt::For {
                    init: Some(Box::new(Spanned::at(
                        4,
                        14,
                        Stmt::declare("int", "j", Some(Spanned::at(4, 22, Expr::literal("int", "0")))),
                    ))),
                    cond: None,
                    update: None,
                    body: Box::new(nested_blocks(1)),
                },
            ),
        ];
        let method = MethodDeclaration::new("void", "run", vec![], body);
        checker.analyze(&program(vec![method]));

        assert_eq!(checker.symtab().scope_depth(), 0);
        assert_eq!(checker.current_method(), None);
        assert!(checker.errors().is_empty());
    }

    #[test]
    fn missing_local_environment_is_downgraded() {
        let mut symtab = SymbolTable::new();
        let mut checker = TypeChecker::new(&mut symtab);

        let decl = Spanned::at(3, 1, Stmt::declare("int", "x", None));
        checker.with_method("ghost", "void", |checker| checker.visit_stmt(&decl));

        assert_eq!(
            checker.warnings(),
            vec!["Error analyzing node: no local variable environment for method 'ghost'"]
        );
    }

    #[test]
    fn locals_are_recorded_per_method() {
        let mut symtab = SymbolTable::new();
        let mut checker = TypeChecker::new(&mut symtab);

        let method = MethodDeclaration::new(
            "int",
            "sum",
            vec![Spanned::at(1, 13, ast::Parameter::new("int", "a"))],
            vec![Spanned::at(2, 9, Stmt::declare("double", "d", None))],
        );
        checker.analyze(&program(vec![method]));

        let env = checker.local_variables("sum").unwrap();
        assert_eq!(env.get("a"), Some(&CheckedType::from_name("int")));
        assert_eq!(env.get("d"), Some(&CheckedType::from_name("double")));
        assert_eq!(checker.symtab().unused_variables(), vec!["a (line 1)", "d (line 2)"]);
    }
}
