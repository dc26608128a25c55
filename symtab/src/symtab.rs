//! Lexical scopes and variable bookkeeping for semantic analysis.
//!
//! [`Scoped`] is a plain scope stack. [`SymbolTable`] builds on it: every
//! declared variable lives in a flat store for the whole run, the scope stack
//! only maps visible names to slots in that store. This way usage can still
//! be reported for variables whose scope has long been closed.
use std::{borrow::Borrow, collections::HashMap, hash::Hash};

mod tokens;

pub use self::tokens::{normalize_lexeme, TokenEntry, TokenTable};

/// Associates a symbol `S` with a stored value `T` within one scope.
pub type ScopeMap<S, T> = HashMap<S, T>;

#[derive(Clone, Copy)]
enum ScopeIdx {
    Root,
    Dynamic(usize),
}

/// Scoped implements lexical scoping on top of `ScopeMap`.
///
/// Definitions in inner scopes shadow definitions of the same symbol in
/// outer scopes. Redefining a symbol within one scope replaces the previous
/// value. The root scope is never left.
pub struct Scoped<S, T>
where
    S: Hash + Eq,
{
    root: ScopeMap<S, T>,
    scopes: Vec<ScopeMap<S, T>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CannotLeaveRootScopeError;

impl std::fmt::Display for CannotLeaveRootScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot leave the root scope")
    }
}

impl<S, T> Default for Scoped<S, T>
where
    S: Hash + Eq,
{
    fn default() -> Self {
        Scoped::new()
    }
}

impl<S, T> Scoped<S, T>
where
    S: Hash + Eq,
{
    pub fn new() -> Self {
        Scoped {
            root: ScopeMap::new(),
            scopes: Vec::new(),
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(ScopeMap::new())
    }

    pub fn leave_scope(&mut self) -> Result<(), CannotLeaveRootScopeError> {
        self.scopes.pop().ok_or(CannotLeaveRootScopeError)?;
        Ok(())
    }

    /// Number of open scopes above the root scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Defines `sym` in the innermost scope. Returns the value it replaced if
    /// `sym` was already defined in that same scope.
    pub fn define(&mut self, sym: S, val: T) -> Option<T> {
        let (current_scope, _) = self.current_scope_mut();
        current_scope.insert(sym, val)
    }

    /// The definition of `sym` in the innermost scope only.
    pub fn local_definition<Q>(&self, sym: &Q) -> Option<&T>
    where
        S: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_scope(self.current_idx()).get(sym)
    }

    /// Resolves `sym` from the innermost to the outermost scope.
    pub fn visible_definition<Q>(&self, sym: &Q) -> Option<&T>
    where
        S: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes
            .iter()
            .rev()
            .chain(std::iter::once(&self.root))
            .find_map(|scope| scope.get(sym))
    }

    /// Drops every definition and every open scope.
    pub fn clear(&mut self) {
        self.root.clear();
        self.scopes.clear();
    }

    fn current_idx(&self) -> ScopeIdx {
        if self.scopes.is_empty() {
            ScopeIdx::Root
        } else {
            ScopeIdx::Dynamic(self.scopes.len() - 1)
        }
    }

    fn current_scope_mut(&mut self) -> (&mut ScopeMap<S, T>, ScopeIdx) {
        let idx = self.current_idx();
        let scope = match idx {
            ScopeIdx::Root => &mut self.root,
            ScopeIdx::Dynamic(idx) => &mut self.scopes[idx],
        };
        (scope, idx)
    }

    fn get_scope(&self, scope_idx: ScopeIdx) -> &ScopeMap<S, T> {
        match scope_idx {
            ScopeIdx::Root => &self.root,
            ScopeIdx::Dynamic(idx) => &self.scopes[idx],
        }
    }
}

/// Everything known about one declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub ty: String,
    pub line: usize,
    pub used: bool,
    /// 0 is the global scope.
    pub scope_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VarId(usize);

/// Variables of all scopes plus the token log of the analyzed file.
pub struct SymbolTable {
    tokens: Vec<TokenEntry>,
    variables: Vec<VariableInfo>,
    scopes: Scoped<String, VarId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            tokens: Vec::new(),
            variables: Vec::new(),
            scopes: Scoped::new(),
        }
    }

    pub fn add_token(&mut self, kind: &str, lexeme: &str, line: usize, column: usize) {
        self.tokens.push(TokenEntry {
            kind: kind.to_string(),
            lexeme: lexeme.to_string(),
            line,
            column,
        });
    }

    pub fn tokens(&self) -> &[TokenEntry] {
        &self.tokens
    }

    pub fn token_table(&self) -> TokenTable<'_> {
        TokenTable::new(&self.tokens)
    }

    pub fn enter_scope(&mut self) {
        self.scopes.enter_scope();
    }

    pub fn leave_scope(&mut self) -> Result<(), CannotLeaveRootScopeError> {
        self.scopes.leave_scope()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Declares `name` in the innermost scope. An outer declaration of the
    /// same name is shadowed, a declaration in the same scope is replaced.
    pub fn add_variable(&mut self, name: &str, ty: &str, line: usize) {
        let info = VariableInfo {
            name: name.to_string(),
            ty: ty.to_string(),
            line,
            used: false,
            scope_depth: self.scopes.depth(),
        };

        match self.scopes.local_definition(name) {
            Some(&VarId(idx)) => self.variables[idx] = info,
            None => {
                let id = VarId(self.variables.len());
                self.variables.push(info);
                self.scopes.define(name.to_string(), id);
            }
        }
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&VariableInfo> {
        self.scopes
            .visible_definition(name)
            .map(|&VarId(idx)| &self.variables[idx])
    }

    /// Unresolved names are ignored.
    pub fn mark_variable_used(&mut self, name: &str) {
        if let Some(&VarId(idx)) = self.scopes.visible_definition(name) {
            self.variables[idx].used = true;
        }
    }

    pub fn is_variable_declared(&self, name: &str) -> bool {
        self.lookup_variable(name).is_some()
    }

    /// Every variable ever declared, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &VariableInfo> {
        self.variables.iter()
    }

    /// `"name (line N)"` for each variable that was never used, including
    /// variables of scopes that are already closed.
    pub fn unused_variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|info| !info.used)
            .map(|info| format!("{} (line {})", info.name, info.line))
            .collect()
    }

    /// Resets to a single empty global scope.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.variables.clear();
        self.scopes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::assert_matches;

    macro_rules! def {
        ($scoped:expr, $s:expr, $t:expr) => {{
            $scoped.define($s, $t);
            let vis = $scoped
                .visible_definition($s)
                .expect("just defined successfully, should be visible");
            assert_eq!(&$t, vis);
        }};
    }

    macro_rules! assert_def {
        ($scoped:expr, $s:expr) => {
            $scoped
                .visible_definition($s)
                .expect(&format!("expecting visible definition for {:?}", $s));
        };
    }

    macro_rules! assert_no_def {
        ($scoped:expr, $s:expr) => {
            let def = $scoped.visible_definition($s);
            assert_matches!(def, None);
        };
    }

    #[test]
    fn definition_inheritance_works() {
        let mut scoped = Scoped::new();
        def!(scoped, "root", 0);
        scoped.enter_scope();
        def!(scoped, "l1", 1);
        scoped.enter_scope();
        def!(scoped, "l2", 2);

        // at l2
        assert_def!(scoped, "root");
        assert_def!(scoped, "l1");
        assert_def!(scoped, "l2");
        scoped.leave_scope().expect("not in root scope");
        // at l1
        assert_def!(scoped, "root");
        assert_def!(scoped, "l1");
        assert_no_def!(scoped, "l2");
        scoped.leave_scope().expect("not in root scope");
        // at root scope
        assert_def!(scoped, "root");
        assert_no_def!(scoped, "l1");
        assert_no_def!(scoped, "l2");
    }

    #[test]
    fn inner_definition_shadows_outer() {
        let mut scoped = Scoped::new();
        def!(scoped, "x", "int");
        scoped.enter_scope();
        def!(scoped, "x", "String");
        assert_eq!(scoped.visible_definition("x"), Some(&"String"));
        scoped.leave_scope().unwrap();
        assert_eq!(scoped.visible_definition("x"), Some(&"int"));
    }

    #[test]
    fn redefinition_in_same_scope_replaces() {
        let mut scoped = Scoped::new();
        assert_eq!(scoped.define("v", 1), None);
        assert_eq!(scoped.define("v", 2), Some(1));
        assert_eq!(scoped.visible_definition("v"), Some(&2));
    }

    #[test]
    fn local_definition_ignores_outer_scopes() {
        let mut scoped = Scoped::new();
        scoped.define("outer", ());
        scoped.enter_scope();
        assert_matches!(scoped.local_definition("outer"), None);
        assert_matches!(scoped.visible_definition("outer"), Some(_));
    }

    #[test]
    fn over_leaves_returns_err() {
        let mut scoped: Scoped<(), ()> = Scoped::new();
        scoped.enter_scope();
        scoped.enter_scope();
        scoped.leave_scope().unwrap();
        scoped.leave_scope().unwrap();
        let ret = scoped.leave_scope();
        assert_matches!(ret, Err(CannotLeaveRootScopeError));
    }

    #[test]
    fn variable_shadowing_resolves_innermost_first() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("x", "int", 1);
        symtab.enter_scope();
        symtab.add_variable("x", "String", 3);
        assert_eq!(symtab.lookup_variable("x").unwrap().ty, "String");
        assert_eq!(symtab.lookup_variable("x").unwrap().scope_depth, 1);
        symtab.leave_scope().unwrap();
        assert_eq!(symtab.lookup_variable("x").unwrap().ty, "int");
    }

    #[test]
    fn redeclaration_in_same_scope_replaces_entry() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("count", "int", 2);
        symtab.add_variable("count", "long", 5);
        assert_eq!(symtab.variables().count(), 1);
        assert_eq!(symtab.lookup_variable("count").unwrap().ty, "long");
        assert_eq!(symtab.unused_variables(), vec!["count (line 5)"]);
    }

    #[test]
    fn unused_variables_survive_closed_scopes() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("a", "int", 1);
        symtab.enter_scope();
        symtab.add_variable("b", "int", 4);
        symtab.leave_scope().unwrap();

        assert!(!symtab.is_variable_declared("b"));
        assert_eq!(symtab.unused_variables(), vec!["a (line 1)", "b (line 4)"]);

        symtab.mark_variable_used("a");
        assert_eq!(symtab.unused_variables(), vec!["b (line 4)"]);
    }

    #[test]
    fn marking_unresolved_name_is_a_noop() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("a", "int", 1);
        symtab.mark_variable_used("missing");
        assert_eq!(symtab.unused_variables(), vec!["a (line 1)"]);
    }

    #[test]
    fn marking_hits_the_shadowing_declaration() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("x", "int", 1);
        symtab.enter_scope();
        symtab.add_variable("x", "int", 2);
        symtab.mark_variable_used("x");
        symtab.leave_scope().unwrap();
        assert_eq!(symtab.unused_variables(), vec!["x (line 1)"]);
    }

    #[test]
    fn clear_resets_to_single_global_scope() {
        let mut symtab = SymbolTable::new();
        symtab.add_variable("a", "int", 1);
        symtab.enter_scope();
        symtab.add_token("IDENTIFIER", "a", 1, 5);
        symtab.clear();

        assert_eq!(symtab.scope_depth(), 0);
        assert!(symtab.tokens().is_empty());
        assert!(symtab.unused_variables().is_empty());
        assert_matches!(symtab.leave_scope(), Err(CannotLeaveRootScopeError));
    }
}
