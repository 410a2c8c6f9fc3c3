//! Arrow-function conversion.

use crate::syntax::{Closure, ClosureBody};

/// Convert `function (...) { return <expr>; }` into `fn (...) => <expr>`.
///
/// Closures with a `use` clause, more than one statement, or a bare `return;`
/// are left alone. So are closures whose body reads a variable other than a
/// parameter or `$this`: an arrow function would capture it from the
/// enclosing scope.
pub fn to_arrow(closure: &Closure) -> Option<Closure> {
    if !closure.captures.is_empty() {
        return None;
    }

    let body = closure.single_return()?;
    let mut reads_outer = false;
    body.for_each_free_var(&mut |name| {
        reads_outer |= name != "$this" && !closure.binds(name);
    });
    if reads_outer {
        return None;
    }

    Some(Closure {
        params: closure.params.clone(),
        captures: Vec::new(),
        body: ClosureBody::Expr(Box::new(body.clone())),
    })
}
