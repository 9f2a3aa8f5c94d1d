use flowcore::{NodeError, Value};
use flowruntime::ScriptLimits;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, Scope, AST};

/// Sandboxed rhai engine for transform scripts.
///
/// Scripts have no I/O, cannot `import` modules or call `eval`, and run
/// under the operation, depth and size limits from `ScriptLimits`. `print`
/// and `debug` output is discarded.
pub struct ScriptSandbox {
    engine: Engine,
}

impl ScriptSandbox {
    pub fn new(limits: &ScriptLimits) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(limits.max_operations);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_collection_size);
        engine.set_max_map_size(limits.max_collection_size);
        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});

        Self { engine }
    }

    /// Parse a script once so it can be run against many values.
    pub fn compile(&self, script: &str) -> Result<AST, NodeError> {
        self.engine
            .compile(script)
            .map_err(|e| NodeError::Configuration(format!("Invalid script: {}", e)))
    }

    /// Run `ast` with `value` bound to the variable `name`.
    pub fn eval(&self, ast: &AST, name: &str, value: &Value) -> Result<Value, NodeError> {
        let bound = rhai::serde::to_dynamic(value).map_err(script_failed)?;

        let mut scope = Scope::new();
        scope.push_dynamic(name, bound);

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .map_err(script_failed)?;

        rhai::serde::from_dynamic::<Value>(&result).map_err(script_failed)
    }
}

fn script_failed(err: Box<rhai::EvalAltResult>) -> NodeError {
    NodeError::ExecutionFailed(format!("Transform execution failed: {}", err))
}
